//! Snapshot envelope sealing using AES-256-GCM.
//!
//! An envelope carries everything except the secret needed to reopen it:
//! ciphertext (with auth tag), the per-seal iv, and the salt and iteration
//! count the key was derived with.

use crate::encoding::{decode_b64url, encode_b64url};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, Salt};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use marco_types::SnapshotEnvelope;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Size of the AES-GCM iv in bytes.
pub const IV_SIZE: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` into an envelope.
///
/// `salt` and `iterations` are recorded verbatim so another device holding
/// the same secret can re-derive the key.
pub fn seal(
    key: &DerivedKey,
    salt: &Salt,
    iterations: u32,
    plaintext: &[u8],
) -> CryptoResult<SnapshotEnvelope> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(SnapshotEnvelope {
        ciphertext: encode_b64url(&ciphertext),
        iv: encode_b64url(&iv),
        salt: salt.to_b64url(),
        iterations,
    })
}

/// Decrypts an envelope with a key derived from its salt and iterations.
pub fn open(key: &DerivedKey, envelope: &SnapshotEnvelope) -> CryptoResult<Vec<u8>> {
    let iv = decode_b64url(&envelope.iv)?;
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidEncoding(format!(
            "iv must be {IV_SIZE} bytes, got {}",
            iv.len()
        )));
    }

    let ciphertext = decode_b64url(&envelope.ciphertext)?;
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::Decryption("data too short".to_string()));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}

/// Seals a UTF-8 string.
pub fn seal_string(
    key: &DerivedKey,
    salt: &Salt,
    iterations: u32,
    plaintext: &str,
) -> CryptoResult<SnapshotEnvelope> {
    seal(key, salt, iterations, plaintext.as_bytes())
}

/// Opens an envelope whose plaintext is UTF-8.
pub fn open_string(key: &DerivedKey, envelope: &SnapshotEnvelope) -> CryptoResult<String> {
    let plaintext = open(key, envelope)?;
    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {e}")))
}

/// Content hash of a snapshot's plaintext: base64url(SHA-256).
pub fn content_hash(plaintext: &[u8]) -> String {
    encode_b64url(&Sha256::digest(plaintext))
}
