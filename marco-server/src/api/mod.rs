//! HTTP surfaces: REST under `/api`, GraphQL on `/graphql`.

pub mod graphql;
pub mod rest;

pub use graphql::{build_schema, SnapshotSchema};
pub use rest::{PushResponse, SnapshotResponse};
