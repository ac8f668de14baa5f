//! Registry of accounts known to the relay.
//!
//! The whole registry is one JSON document (`users.json`). Every mutation
//! reads it, changes it and writes it back under the write side of a single
//! lock; readers share the read side.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use common::crypto::PublicKey;
use common::identifier;

pub const TOKEN_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: String,
    pub machine_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    /// hex encoded Ed25519 public key
    pub public_key: String,
    pub api_token: String,
    #[serde(default)]
    pub machines: Vec<Machine>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Accounts {
    #[serde(default)]
    accounts: BTreeMap<String, Account>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("account name already taken: {0}")]
    NameTaken(String),
    #[error("public key already registered to {0}")]
    KeyTaken(String),
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt user directory: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn generate_token() -> String {
    let mut token = [0u8; TOKEN_SIZE];
    getrandom::getrandom(&mut token).expect("failed to generate random bytes");
    hex::encode(token)
}

fn tokens_match(presented: &str, stored: &str) -> bool {
    // blake3::Hash compares in constant time
    blake3::hash(presented.as_bytes()) == blake3::hash(stored.as_bytes())
}

#[derive(Debug)]
pub struct UserDirectory {
    path: PathBuf,
    lock: RwLock<()>,
}

impl UserDirectory {
    /// Open (or lazily create) the directory document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Accounts, DirectoryError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Accounts::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, accounts: &Accounts) -> Result<(), DirectoryError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(accounts)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Accounts) -> Result<T, DirectoryError>,
    ) -> Result<T, DirectoryError> {
        let _guard = self.lock.write();
        let mut accounts = self.read()?;
        let out = f(&mut accounts)?;
        self.write(&accounts)?;
        Ok(out)
    }

    fn with_accounts<T>(&self, f: impl FnOnce(&Accounts) -> T) -> Result<T, DirectoryError> {
        let _guard = self.lock.read();
        let accounts = self.read()?;
        Ok(f(&accounts))
    }

    /// Allocate a fresh name for `public_key` and return `(name, api_token)`.
    pub fn register(&self, public_key: &PublicKey) -> Result<(String, String), DirectoryError> {
        let name = identifier::generate();
        let key_hex = public_key.to_hex();
        let api_token = generate_token();

        self.mutate(|accounts| {
            if accounts.accounts.contains_key(&name) {
                return Err(DirectoryError::NameTaken(name.clone()));
            }
            if let Some(existing) = accounts
                .accounts
                .values()
                .find(|a| a.public_key == key_hex)
            {
                return Err(DirectoryError::KeyTaken(existing.name.clone()));
            }
            accounts.accounts.insert(
                name.clone(),
                Account {
                    name: name.clone(),
                    public_key: key_hex.clone(),
                    api_token: api_token.clone(),
                    machines: Vec::new(),
                },
            );
            Ok(())
        })?;

        tracing::info!(name = %name, "registered account");
        Ok((name, api_token))
    }

    pub fn lookup(&self, name: &str) -> Result<bool, DirectoryError> {
        self.with_accounts(|a| a.accounts.contains_key(name))
    }

    pub fn account(&self, name: &str) -> Result<Option<Account>, DirectoryError> {
        self.with_accounts(|a| a.accounts.get(name).cloned())
    }

    pub fn lookup_by_public_key(
        &self,
        public_key: &PublicKey,
    ) -> Result<Option<String>, DirectoryError> {
        let key_hex = public_key.to_hex();
        self.with_accounts(|a| {
            a.accounts
                .values()
                .find(|account| account.public_key == key_hex)
                .map(|account| account.name.clone())
        })
    }

    pub fn public_key(&self, name: &str) -> Result<Option<String>, DirectoryError> {
        self.with_accounts(|a| a.accounts.get(name).map(|account| account.public_key.clone()))
    }

    /// True only for a known name presenting its current token.
    pub fn authenticate(&self, name: &str, token: &str) -> Result<bool, DirectoryError> {
        self.with_accounts(|a| match a.accounts.get(name) {
            Some(account) => tokens_match(token, &account.api_token),
            None => false,
        })
    }

    /// Replace the api token for `name`, invalidating the old one.
    pub fn reissue_token(&self, name: &str) -> Result<String, DirectoryError> {
        let token = generate_token();
        self.mutate(|accounts| {
            let account = accounts
                .accounts
                .get_mut(name)
                .ok_or_else(|| DirectoryError::UnknownAccount(name.to_string()))?;
            account.api_token = token.clone();
            Ok(())
        })?;
        Ok(token)
    }

    /// Mint a token for `machine_id` under `name`; rebinding replaces it.
    pub fn bind_machine(&self, name: &str, machine_id: &str) -> Result<String, DirectoryError> {
        let token = generate_token();
        self.mutate(|accounts| {
            let account = accounts
                .accounts
                .get_mut(name)
                .ok_or_else(|| DirectoryError::UnknownAccount(name.to_string()))?;
            account.machines.retain(|m| m.machine_id != machine_id);
            account.machines.push(Machine {
                machine_id: machine_id.to_string(),
                machine_token: token.clone(),
            });
            Ok(())
        })?;
        Ok(token)
    }

    /// Names are generated with a checksum; anything else cannot be ours.
    pub fn verify_identifier(name: &str) -> bool {
        identifier::verify(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::crypto::SecretKey;
    use tempfile::TempDir;

    fn directory() -> (TempDir, UserDirectory) {
        let dir = TempDir::new().unwrap();
        let directory = UserDirectory::open(dir.path().join("users.json"));
        (dir, directory)
    }

    #[test]
    fn register_and_lookup() {
        let (_dir, directory) = directory();
        let key = SecretKey::generate().public();

        let (name, token) = directory.register(&key).unwrap();
        assert!(UserDirectory::verify_identifier(&name));
        assert_eq!(token.len(), TOKEN_SIZE * 2);

        assert!(directory.lookup(&name).unwrap());
        assert!(!directory.lookup("nobody").unwrap());
        assert_eq!(directory.public_key(&name).unwrap(), Some(key.to_hex()));
        assert_eq!(directory.lookup_by_public_key(&key).unwrap(), Some(name));
    }

    #[test]
    fn second_registration_for_key_conflicts() {
        let (_dir, directory) = directory();
        let key = SecretKey::generate().public();

        let (name, token) = directory.register(&key).unwrap();
        match directory.register(&key) {
            Err(DirectoryError::KeyTaken(existing)) => assert_eq!(existing, name),
            other => panic!("expected KeyTaken, got {:?}", other),
        }
        // the original credentials are untouched
        assert!(directory.authenticate(&name, &token).unwrap());
        assert_eq!(directory.account(&name).unwrap().unwrap().api_token, token);
    }

    #[test]
    fn authenticate_requires_matching_token() {
        let (_dir, directory) = directory();
        let (name, token) = directory.register(&SecretKey::generate().public()).unwrap();

        assert!(directory.authenticate(&name, &token).unwrap());
        assert!(!directory.authenticate(&name, "deadbeef").unwrap());
        assert!(!directory.authenticate(&name, "").unwrap());
        assert!(!directory.authenticate("someone-else", &token).unwrap());
    }

    #[test]
    fn reissue_invalidates_old_token() {
        let (_dir, directory) = directory();
        let (name, old) = directory.register(&SecretKey::generate().public()).unwrap();

        let new = directory.reissue_token(&name).unwrap();
        assert_ne!(old, new);
        assert!(!directory.authenticate(&name, &old).unwrap());
        assert!(directory.authenticate(&name, &new).unwrap());
        assert!(matches!(
            directory.reissue_token("missing"),
            Err(DirectoryError::UnknownAccount(_))
        ));
    }

    #[test]
    fn bind_machine_replaces_existing_binding() {
        let (_dir, directory) = directory();
        let (name, _) = directory.register(&SecretKey::generate().public()).unwrap();

        let first = directory.bind_machine(&name, "laptop").unwrap();
        let second = directory.bind_machine(&name, "laptop").unwrap();
        directory.bind_machine(&name, "desktop").unwrap();

        let account = directory.account(&name).unwrap().unwrap();
        assert_eq!(account.machines.len(), 2);
        let laptop = account
            .machines
            .iter()
            .find(|m| m.machine_id == "laptop")
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(laptop.machine_token, second);
    }

    #[test]
    fn state_survives_reopen() {
        let (dir, directory) = directory();
        let (name, token) = directory.register(&SecretKey::generate().public()).unwrap();
        drop(directory);

        let reopened = UserDirectory::open(dir.path().join("users.json"));
        assert!(reopened.authenticate(&name, &token).unwrap());
    }
}
