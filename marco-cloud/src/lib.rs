//! Cloud drive adapters for Marco snapshots.
//!
//! Each adapter mirrors the latest encrypted snapshot of a project into one
//! file in the provider's application folder and can fetch it back:
//!
//! - [`GoogleDriveClient`]: Drive v3 `appDataFolder`, located by custom
//!   file properties, written with a multipart upload.
//! - [`OneDriveClient`]: Microsoft Graph app root, located by file name,
//!   written with a single content `PUT`.
//!
//! Adapters never decrypt the envelope and never retry; a non-2xx response
//! becomes [`CloudError::Api`] with the status and body. Tokens live in a
//! [`ProviderRegistry`] owned by the caller.

mod client;
mod error;
pub mod google_drive;
pub mod onedrive;
mod registry;

pub use client::ProviderClient;
pub use error::{CloudError, CloudResult};
pub use google_drive::{GoogleDriveClient, GoogleDriveConfig};
pub use onedrive::{OneDriveClient, OneDriveConfig};
pub use registry::ProviderRegistry;
