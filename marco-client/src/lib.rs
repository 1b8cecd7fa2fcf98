//! Device-side client for the Marco snapshot service.
//!
//! Derives a key from the user's secret, seals project data into a
//! [`SnapshotEnvelope`](marco_types::SnapshotEnvelope) before it leaves the
//! device, and talks to the service over REST (push, pull, provider tokens)
//! and GraphQL (listing). Progress is observable through a
//! [`tokio::sync::watch`] channel of [`SyncStatus`].

mod client;
mod error;
mod options;
mod status;

pub use client::{PushSnapshot, SnapshotSummary, SyncClient};
pub use error::{ClientError, ClientResult};
pub use options::{generate_device_id, SyncClientOptions, SyncCredentials};
pub use status::{SyncMode, SyncStatus};
