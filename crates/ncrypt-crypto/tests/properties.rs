// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for the AEAD engine and group key wrapping.

use std::collections::HashSet;

use ncrypt_core::{MemberId, NcryptError};
use ncrypt_crypto::group::{unwrap_group_key, wrap_for_member};
use ncrypt_crypto::{EncryptedEnvelope, GroupKeyring, decrypt, encrypt, generate_key, seal};
use proptest::prelude::*;

proptest! {
    #[test]
    fn decrypt_inverts_encrypt(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
        let (key, _) = generate_key().unwrap();
        let sealed = encrypt(&plaintext, Some(&key)).unwrap();
        let opened = decrypt(&sealed.envelope, &key).unwrap();
        prop_assert_eq!(opened.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn any_single_bit_flip_is_detected(
        plaintext in proptest::collection::vec(any::<u8>(), 1..128),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let (key, _) = generate_key().unwrap();
        let envelope = seal(&key, &plaintext).unwrap();

        let mut ct = envelope.ciphertext().to_vec();
        let i = index.index(ct.len());
        ct[i] ^= 1 << bit;
        let tampered = EncryptedEnvelope::new(ct, *envelope.nonce());

        let result = decrypt(&tampered, &key);
        prop_assert!(matches!(result, Err(NcryptError::DecryptionFailed(_))));
    }

    #[test]
    fn wire_json_roundtrip_preserves_envelope(plaintext in proptest::collection::vec(any::<u8>(), 0..64)) {
        let (key, _) = generate_key().unwrap();
        let envelope = seal(&key, &plaintext).unwrap();
        let json = envelope.to_json_string().unwrap();
        let parsed = EncryptedEnvelope::from_json_str(&json).unwrap();
        let opened = decrypt(&parsed, &key).unwrap();
        prop_assert_eq!(opened.as_slice(), plaintext.as_slice());
    }
}

#[test]
fn ten_thousand_encryptions_never_repeat_a_nonce() {
    let (key, _) = generate_key().unwrap();
    let mut seen = HashSet::with_capacity(10_000);

    for _ in 0..10_000 {
        let envelope = seal(&key, b"x").unwrap();
        assert!(seen.insert(*envelope.nonce()), "nonce collision");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_encryptions_never_repeat_a_nonce() {
    let (key, _) = generate_key().unwrap();
    let key = std::sync::Arc::new(key);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            (0..500)
                .map(|_| *seal(&key, b"y").unwrap().nonce())
                .collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for nonce in handle.await.unwrap() {
            assert!(seen.insert(nonce), "nonce collision across tasks");
        }
    }
    assert_eq!(seen.len(), 4_000);
}

#[test]
fn group_grants_are_member_specific() {
    let keys: Vec<_> = (0..5).map(|_| generate_key().unwrap().0).collect();
    let (mut ring, group_key) = GroupKeyring::create(MemberId(0), &keys[0]).unwrap();
    for (i, key) in keys.iter().enumerate().skip(1) {
        ring.add_member(&group_key, MemberId(i as i64), key).unwrap();
    }

    for (i, key_i) in keys.iter().enumerate() {
        let grant = ring.grant(MemberId(i as i64)).unwrap();
        assert_eq!(unwrap_group_key(&grant, key_i).unwrap(), group_key);

        for (j, key_j) in keys.iter().enumerate() {
            if i != j {
                assert!(unwrap_group_key(&grant, key_j).is_err());
            }
        }
    }

    // Re-wrapping for an existing member replaces the grant but keeps the key.
    let regrant = wrap_for_member(&group_key, MemberId(2), &keys[2]).unwrap();
    assert_ne!(Some(regrant.clone()), ring.grant(MemberId(2)));
    assert_eq!(unwrap_group_key(&regrant, &keys[2]).unwrap(), group_key);
}
