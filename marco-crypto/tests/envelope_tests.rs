use marco_crypto::{
    content_hash, decode_b64url, derive_key, encode_b64url, generate_random_key, open,
    open_string, seal, seal_string, CryptoError, KdfParams, Salt, IV_SIZE,
};
use marco_types::SnapshotEnvelope;

fn sealed(plaintext: &[u8]) -> (marco_crypto::DerivedKey, Salt, SnapshotEnvelope) {
    let key = generate_random_key();
    let salt = Salt::random();
    let envelope = seal(&key, &salt, 1_000, plaintext).unwrap();
    (key, salt, envelope)
}

#[test]
fn seal_open_roundtrip() {
    let (key, _, envelope) = sealed(b"Hello, World!");
    assert_eq!(open(&key, &envelope).unwrap(), b"Hello, World!");
}

#[test]
fn seal_open_empty() {
    let (key, _, envelope) = sealed(b"");
    assert_eq!(open(&key, &envelope).unwrap(), b"");
}

#[test]
fn seal_open_large_data() {
    let plaintext: Vec<u8> = (0..10000).map(|i| (i % 256) as u8).collect();
    let (key, _, envelope) = sealed(&plaintext);
    assert_eq!(open(&key, &envelope).unwrap(), plaintext);
}

#[test]
fn envelope_records_salt_and_iterations() {
    let (_, salt, envelope) = sealed(b"data");
    assert_eq!(envelope.salt, salt.to_b64url());
    assert_eq!(envelope.iterations, 1_000);
    assert_eq!(decode_b64url(&envelope.iv).unwrap().len(), IV_SIZE);
}

#[test]
fn envelope_fields_are_unpadded_base64url() {
    let (_, _, envelope) = sealed(b"some bytes that need encoding");
    for field in [&envelope.ciphertext, &envelope.iv, &envelope.salt] {
        assert!(!field.contains('='));
        assert!(!field.contains('+'));
        assert!(!field.contains('/'));
    }
}

#[test]
fn wrong_key_fails() {
    let (_, _, envelope) = sealed(b"Secret");
    let other = generate_random_key();
    assert!(matches!(
        open(&other, &envelope),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn tampered_ciphertext_fails() {
    let (key, _, mut envelope) = sealed(b"Secret");
    let mut bytes = decode_b64url(&envelope.ciphertext).unwrap();
    bytes[0] ^= 0xFF;
    envelope.ciphertext = encode_b64url(&bytes);
    assert!(open(&key, &envelope).is_err());
}

#[test]
fn short_iv_is_rejected() {
    let (key, _, mut envelope) = sealed(b"Secret");
    envelope.iv = encode_b64url(&[0u8; 4]);
    assert!(matches!(
        open(&key, &envelope),
        Err(CryptoError::InvalidEncoding(_))
    ));
}

#[test]
fn truncated_ciphertext_is_rejected() {
    let (key, _, mut envelope) = sealed(b"Secret");
    envelope.ciphertext = encode_b64url(&[1, 2, 3]);
    assert!(open(&key, &envelope).is_err());
}

#[test]
fn same_plaintext_produces_different_envelopes() {
    let key = generate_random_key();
    let salt = Salt::random();
    let e1 = seal(&key, &salt, 1, b"Same").unwrap();
    let e2 = seal(&key, &salt, 1, b"Same").unwrap();
    assert_ne!(e1.iv, e2.iv);
    assert_ne!(e1.ciphertext, e2.ciphertext);
}

// ── Strings ─────────────────────────────────────────────────────

#[test]
fn string_seal_open() {
    let key = generate_random_key();
    let salt = Salt::random();
    let plaintext = "Festa de 15 anos — 120 convidados 🎉";
    let envelope = seal_string(&key, &salt, 1, plaintext).unwrap();
    assert_eq!(open_string(&key, &envelope).unwrap(), plaintext);
}

#[test]
fn reopen_with_rederived_key() {
    let params = KdfParams { iterations: 1_000 };
    let salt = Salt::random();
    let key = derive_key("+5511:pw", &salt, &params).unwrap();
    let envelope = seal_string(&key, &salt, params.iterations, "{\"a\":1}").unwrap();

    // Another device only has the secret plus what the envelope carries.
    let salt_again = Salt::from_b64url(&envelope.salt).unwrap();
    let key_again = derive_key(
        "+5511:pw",
        &salt_again,
        &KdfParams {
            iterations: envelope.iterations,
        },
    )
    .unwrap();
    assert_eq!(open_string(&key_again, &envelope).unwrap(), "{\"a\":1}");
}

// ── Hash ────────────────────────────────────────────────────────

#[test]
fn content_hash_of_empty_input() {
    assert_eq!(
        content_hash(b""),
        "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
    );
}

#[test]
fn content_hash_differs_per_input() {
    assert_ne!(content_hash(b"a"), content_hash(b"b"));
    assert_eq!(content_hash(b"a"), content_hash(b"a"));
}
