//! Per-file content key.
//!
//! Every sealed file gets its own random [`Secret`]. It is never stored or
//! sent as is: each recipient receives a wrapped copy (see `SecretShare`)
//! inside the envelope header.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::{Deserialize, Serialize};

pub const NONCE_SIZE: usize = 12;
pub const SECRET_SIZE: usize = 32;
pub const BLAKE3_HASH_SIZE: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("content key must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("no randomness available for a nonce")]
    Rng,
    #[error("sealed content is truncated")]
    Truncated,
    /// Wrong key or modified ciphertext; the AEAD cannot tell which.
    #[error("sealed content failed authentication")]
    Authentication,
    #[error("content hash mismatch")]
    Corrupted,
}

/// A ChaCha20-Poly1305 key used for exactly one file.
///
/// Sealed layout: `nonce || AEAD(blake3(plaintext) || plaintext)`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Secret([u8; SECRET_SIZE]);

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        let bytes: [u8; SECRET_SIZE] = data
            .try_into()
            .map_err(|_| SecretError::InvalidLength(data.len()))?;
        Ok(bytes.into())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Seal `data` under a fresh random nonce.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce).map_err(|_| SecretError::Rng)?;

        let mut framed = Vec::with_capacity(BLAKE3_HASH_SIZE + data.len());
        framed.extend_from_slice(blake3::hash(data).as_bytes());
        framed.extend_from_slice(data);

        let sealed = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), framed.as_slice())
            .map_err(|_| SecretError::Authentication)?;

        let mut out = nonce.to_vec();
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Reverse [`Secret::encrypt`].
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        if data.len() < NONCE_SIZE {
            return Err(SecretError::Truncated);
        }
        let (nonce, sealed) = data.split_at(NONCE_SIZE);

        let framed = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| SecretError::Authentication)?;
        if framed.len() < BLAKE3_HASH_SIZE {
            return Err(SecretError::Truncated);
        }

        let (hash, plaintext) = framed.split_at(BLAKE3_HASH_SIZE);
        if hash != blake3::hash(plaintext).as_bytes() {
            return Err(SecretError::Corrupted);
        }
        Ok(plaintext.to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seal_and_open() {
        let secret = Secret::generate();
        let data = b"quarterly numbers, do not forward";

        let sealed = secret.encrypt(data).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + BLAKE3_HASH_SIZE + data.len() + 16);
        assert_eq!(secret.decrypt(&sealed).unwrap(), data);
    }

    #[test]
    fn nonce_is_fresh_every_time() {
        let secret = Secret::generate();
        assert_ne!(
            secret.encrypt(b"same input").unwrap(),
            secret.encrypt(b"same input").unwrap()
        );
    }

    #[test]
    fn length_is_checked() {
        assert_eq!(
            Secret::from_slice(&[1u8; 16]),
            Err(SecretError::InvalidLength(16))
        );
        assert!(Secret::from_slice(&[1u8; SECRET_SIZE]).is_ok());
    }

    #[test]
    fn wrong_key_and_tampering() {
        let secret = Secret::generate();
        let mut sealed = secret.encrypt(b"for one recipient only").unwrap();

        assert_eq!(
            Secret::generate().decrypt(&sealed),
            Err(SecretError::Authentication)
        );
        assert_eq!(secret.decrypt(&sealed[..4]), Err(SecretError::Truncated));

        sealed[NONCE_SIZE + 10] ^= 0xFF;
        assert_eq!(secret.decrypt(&sealed), Err(SecretError::Authentication));
    }

    #[test]
    fn empty_file() {
        let secret = Secret::generate();
        let sealed = secret.encrypt(b"").unwrap();
        assert!(secret.decrypt(&sealed).unwrap().is_empty());
    }
}
