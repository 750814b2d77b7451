//! Relationship-scoped message encryption.
//!
//! Every matched pair gets its own 256-bit key, derived with HKDF-SHA256 from
//! the server secret and the pair key. Payloads are
//! `hex(nonce[24] || XChaCha20-Poly1305 ciphertext)`.

use std::sync::Arc;

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Key, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::matches::registry;

const KEY_SALT: &[u8] = b"heartlink/pair-key/v1";
const NONCE_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("payload is not valid hex")]
    Encoding(#[from] hex::FromHexError),

    #[error("payload is too short")]
    Truncated,

    #[error("payload failed authentication")]
    Decrypt,

    #[error("encryption failed")]
    Encrypt,

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("decrypted payload is not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Clone)]
pub struct MessageVault {
    master: Arc<[u8]>,
}

impl MessageVault {
    pub fn new(secret: &str) -> Self {
        Self {
            master: Arc::from(secret.as_bytes()),
        }
    }

    pub fn pair_key(&self, a: Uuid, b: Uuid) -> Result<PairKey, VaultError> {
        let hk = Hkdf::<Sha256>::new(Some(KEY_SALT), &self.master);
        let mut okm = [0u8; 32];
        hk.expand(registry::pair_key(a, b).as_bytes(), &mut okm)
            .map_err(|_| VaultError::KeyDerivation)?;

        Ok(PairKey {
            key: *Key::from_slice(&okm),
        })
    }
}

pub struct PairKey {
    key: Key,
}

impl PairKey {
    pub fn seal(&self, plaintext: &str) -> Result<String, VaultError> {
        let cipher = XChaCha20Poly1305::new(&self.key);
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encrypt)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&ciphertext);
        Ok(hex::encode(payload))
    }

    pub fn open(&self, payload: &str) -> Result<String, VaultError> {
        let bytes = hex::decode(payload.trim())?;
        if bytes.len() < NONCE_LEN {
            return Err(VaultError::Truncated);
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = XChaCha20Poly1305::new(&self.key)
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| VaultError::Decrypt)?;
        Ok(String::from_utf8(plaintext)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.key.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_reverses_seal() {
        let vault = MessageVault::new("server-secret");
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let key = vault.pair_key(a, b).unwrap();

        let payload = key.seal("see you at eight?").unwrap();
        assert_eq!(key.open(&payload).unwrap(), "see you at eight?");
    }

    #[test]
    fn either_member_derives_the_same_key() {
        let vault = MessageVault::new("server-secret");
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());

        let payload = vault.pair_key(a, b).unwrap().seal("hi").unwrap();
        assert_eq!(vault.pair_key(b, a).unwrap().open(&payload).unwrap(), "hi");
    }

    #[test]
    fn other_pairs_cannot_read() {
        let vault = MessageVault::new("server-secret");
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

        let payload = vault.pair_key(a, b).unwrap().seal("private").unwrap();
        assert!(matches!(vault.pair_key(a, c).unwrap().open(&payload), Err(VaultError::Decrypt)));
    }

    #[test]
    fn tampered_payload_fails() {
        let vault = MessageVault::new("server-secret");
        let key = vault.pair_key(Uuid::now_v7(), Uuid::now_v7()).unwrap();

        let mut payload = key.seal("hello").unwrap().into_bytes();
        let last = payload.len() - 1;
        payload[last] = if payload[last] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(payload).unwrap();

        assert!(matches!(key.open(&tampered), Err(VaultError::Decrypt)));
        assert!(matches!(key.open("abcd"), Err(VaultError::Truncated)));
        assert!(matches!(key.open("not hex"), Err(VaultError::Encoding(_))));
    }

    #[test]
    fn sealing_twice_uses_fresh_nonces() {
        let key = MessageVault::new("s").pair_key(Uuid::now_v7(), Uuid::now_v7()).unwrap();
        assert_ne!(key.seal("same").unwrap(), key.seal("same").unwrap());
    }
}
