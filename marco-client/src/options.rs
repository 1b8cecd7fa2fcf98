//! Client options and credentials.

use marco_crypto::DEFAULT_ITERATIONS;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Where the snapshot service lives and how this device encrypts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncClientOptions {
    /// Service origin, e.g. `http://localhost:3333`.
    pub base_url: String,
    pub api_path: String,
    pub graphql_path: String,
    /// Stable device id; generated when absent.
    pub device_id: Option<String>,
    /// PBKDF2 iterations used when the credentials do not name any.
    pub iterations: u32,
    pub timeout_secs: u64,
}

impl Default for SyncClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3333".to_string(),
            api_path: "/api".to_string(),
            graphql_path: "/graphql".to_string(),
            device_id: None,
            iterations: DEFAULT_ITERATIONS,
            timeout_secs: 30,
        }
    }
}

impl SyncClientOptions {
    /// Options pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub(crate) fn api_base(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.api_path)
    }

    pub(crate) fn graphql_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.graphql_path)
    }
}

/// `dev_` followed by eight random base36 characters.
pub fn generate_device_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("dev_{suffix}")
}

/// The user secret the snapshot key is derived from.
///
/// `salt` is base64url; supply the salt of an existing snapshot to derive
/// the key that opens it.
#[derive(Clone, Default)]
pub struct SyncCredentials {
    pub phone: String,
    pub password: String,
    pub salt: Option<String>,
    pub iterations: Option<u32>,
}

impl SyncCredentials {
    pub fn new(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            password: password.into(),
            salt: None,
            iterations: None,
        }
    }

    pub(crate) fn secret(&self) -> String {
        format!("{}:{}", self.phone, self.password)
    }
}

impl fmt::Debug for SyncCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCredentials")
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("salt", &self.salt)
            .field("iterations", &self.iterations)
            .finish()
    }
}
