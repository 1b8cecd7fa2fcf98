//! Client-side snapshot encryption for Marco.
//!
//! Snapshots are encrypted on the device before they are pushed; the server
//! and provider adapters only ever see a [`SnapshotEnvelope`].
//!
//! # Example
//!
//! ```
//! use marco_crypto::{derive_key, open_string, seal_string, KdfParams, Salt};
//!
//! let salt = Salt::random();
//! let params = KdfParams { iterations: 1_000 };
//! let key = derive_key("+5511999999999:hunter2", &salt, &params).unwrap();
//!
//! let envelope = seal_string(&key, &salt, params.iterations, r#"{"guests":12}"#).unwrap();
//! assert_eq!(open_string(&key, &envelope).unwrap(), r#"{"guests":12}"#);
//! ```
//!
//! [`SnapshotEnvelope`]: marco_types::SnapshotEnvelope

mod encoding;
mod envelope;
mod error;
mod key;

pub use encoding::{decode_b64url, encode_b64url};
pub use envelope::{content_hash, open, open_string, seal, seal_string, IV_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, generate_random_key, DerivedKey, KdfParams, Salt, DEFAULT_ITERATIONS, KEY_SIZE,
    SALT_SIZE,
};
