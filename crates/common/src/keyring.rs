//! In-process holder for unlocked secret keys.

use crate::crypto::{PublicKey, SecretKey};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyringError {
    #[error("keyring is locked")]
    Locked,
    #[error("keyring is already locked")]
    AlreadyLocked,
    #[error("keyring is not locked")]
    NotLocked,
    #[error("incorrect passphrase")]
    IncorrectPassphrase,
    #[error("key not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyringEntry {
    pub public_key: PublicKey,
    pub comment: String,
}

/// Something that can hold secret keys on behalf of a session.
///
/// A locked keyring lists nothing and refuses to hand out or accept keys
/// until unlocked with the same passphrase.
pub trait Keyring: Send + Sync {
    fn list(&self) -> Result<Vec<KeyringEntry>, KeyringError>;
    fn add(&mut self, key: SecretKey, comment: &str) -> Result<(), KeyringError>;
    fn remove(&mut self, public_key: &PublicKey) -> Result<(), KeyringError>;
    fn remove_all(&mut self) -> Result<(), KeyringError>;
    fn lock(&mut self, passphrase: &[u8]) -> Result<(), KeyringError>;
    fn unlock(&mut self, passphrase: &[u8]) -> Result<(), KeyringError>;
    fn get(&self, public_key: &PublicKey) -> Result<SecretKey, KeyringError>;
}

#[derive(Debug, Default)]
pub struct MemoryKeyring {
    keys: Vec<(SecretKey, String)>,
    locked: Option<blake3::Hash>,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_unlocked(&self) -> Result<(), KeyringError> {
        match self.locked {
            Some(_) => Err(KeyringError::Locked),
            None => Ok(()),
        }
    }
}

impl Keyring for MemoryKeyring {
    fn list(&self) -> Result<Vec<KeyringEntry>, KeyringError> {
        if self.locked.is_some() {
            return Ok(Vec::new());
        }
        Ok(self
            .keys
            .iter()
            .map(|(key, comment)| KeyringEntry {
                public_key: key.public(),
                comment: comment.clone(),
            })
            .collect())
    }

    fn add(&mut self, key: SecretKey, comment: &str) -> Result<(), KeyringError> {
        self.ensure_unlocked()?;
        let public_key = key.public();
        // re-adding a key replaces its comment
        self.keys.retain(|(k, _)| k.public() != public_key);
        self.keys.push((key, comment.to_string()));
        Ok(())
    }

    fn remove(&mut self, public_key: &PublicKey) -> Result<(), KeyringError> {
        self.ensure_unlocked()?;
        let before = self.keys.len();
        self.keys.retain(|(k, _)| &k.public() != public_key);
        if self.keys.len() == before {
            return Err(KeyringError::NotFound(public_key.to_hex()));
        }
        Ok(())
    }

    fn remove_all(&mut self) -> Result<(), KeyringError> {
        self.ensure_unlocked()?;
        self.keys.clear();
        Ok(())
    }

    fn lock(&mut self, passphrase: &[u8]) -> Result<(), KeyringError> {
        if self.locked.is_some() {
            return Err(KeyringError::AlreadyLocked);
        }
        self.locked = Some(blake3::hash(passphrase));
        Ok(())
    }

    fn unlock(&mut self, passphrase: &[u8]) -> Result<(), KeyringError> {
        match self.locked {
            None => Err(KeyringError::NotLocked),
            // blake3::Hash equality is constant time
            Some(hash) if hash == blake3::hash(passphrase) => {
                self.locked = None;
                Ok(())
            }
            Some(_) => Err(KeyringError::IncorrectPassphrase),
        }
    }

    fn get(&self, public_key: &PublicKey) -> Result<SecretKey, KeyringError> {
        self.ensure_unlocked()?;
        self.keys
            .iter()
            .find(|(k, _)| &k.public() == public_key)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| KeyringError::NotFound(public_key.to_hex()))
    }
}
