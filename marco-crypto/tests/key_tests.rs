use marco_crypto::{
    decode_b64url, derive_key, encode_b64url, CryptoError, KdfParams, Salt, DEFAULT_ITERATIONS,
    SALT_SIZE,
};
use proptest::prelude::*;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[test]
fn pbkdf2_sha256_known_vector() {
    let salt = Salt::from_bytes(b"salt".to_vec());
    let key = derive_key("password", &salt, &KdfParams { iterations: 1 }).unwrap();
    assert_eq!(
        hex(key.as_bytes()),
        "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
    );
}

#[test]
fn derivation_is_deterministic() {
    let salt = Salt::random();
    let params = KdfParams { iterations: 100 };
    let a = derive_key("secret", &salt, &params).unwrap();
    let b = derive_key("secret", &salt, &params).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn different_salts_give_different_keys() {
    let params = KdfParams { iterations: 100 };
    let a = derive_key("secret", &Salt::random(), &params).unwrap();
    let b = derive_key("secret", &Salt::random(), &params).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn zero_iterations_rejected() {
    let result = derive_key("secret", &Salt::random(), &KdfParams { iterations: 0 });
    assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
}

#[test]
fn default_params() {
    assert_eq!(KdfParams::default().iterations, DEFAULT_ITERATIONS);
    assert_eq!(DEFAULT_ITERATIONS, 310_000);
}

#[test]
fn debug_redacts_key() {
    let key = derive_key("secret", &Salt::random(), &KdfParams { iterations: 1 }).unwrap();
    let debug = format!("{key:?}");
    assert!(debug.contains("REDACTED"));
}

// ── Salt ────────────────────────────────────────────────────────

#[test]
fn random_salt_has_default_size() {
    assert_eq!(Salt::random().as_bytes().len(), SALT_SIZE);
}

#[test]
fn salt_b64url_roundtrip() {
    let salt = Salt::random();
    assert_eq!(Salt::from_b64url(&salt.to_b64url()).unwrap(), salt);
}

#[test]
fn padded_salt_is_accepted() {
    let salt = Salt::from_bytes(vec![7u8; 16]);
    let padded = format!("{}==", salt.to_b64url());
    assert_eq!(Salt::from_b64url(&padded).unwrap(), salt);
}

#[test]
fn empty_salt_rejected() {
    assert!(Salt::from_b64url("").is_err());
}

#[test]
fn invalid_salt_rejected() {
    assert!(matches!(
        Salt::from_b64url("!!!"),
        Err(CryptoError::InvalidEncoding(_))
    ));
}

proptest! {
    #[test]
    fn b64url_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        prop_assert_eq!(decode_b64url(&encode_b64url(&bytes)).unwrap(), bytes);
    }
}
