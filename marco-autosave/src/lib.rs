//! Write queue for Marco.
//!
//! [`AutoSaver`] sits in front of a [`FlushTarget`] and protects user edits
//! from loss:
//!
//! - Operations carrying an entity id collapse to their latest value;
//!   operations without one are kept in arrival order.
//! - Flushes are debounced and at most one is in flight at a time.
//! - Failed flushes retry with exponential backoff plus jitter. After
//!   [`AutoSaveConfig::max_retries`] consecutive failures the pending queue
//!   is dropped and the loss is logged.
//! - While [`Connectivity`] reports offline nothing is flushed; going back
//!   online schedules an immediate flush.
//!
//! ```no_run
//! use marco_autosave::{AutoSaveConfig, AutoSaver, Connectivity, QueuedOperation};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run(target: Arc<dyn marco_autosave::FlushTarget>) {
//! let saver = AutoSaver::new(AutoSaveConfig::default(), target, Connectivity::online());
//! saver.queue(QueuedOperation::entity("profile", json!({"name": "Ada"})));
//! saver.flush().await.ok();
//! # }
//! ```

mod config;
mod connectivity;
mod error;
mod queue;
mod saver;
mod target;

pub use config::AutoSaveConfig;
pub use connectivity::Connectivity;
pub use error::{AutoSaveError, AutoSaveResult};
pub use queue::QueuedOperation;
pub use saver::{AutoSaver, FlushOutcome};
pub use target::{FlushTarget, StoreFlushTarget};
