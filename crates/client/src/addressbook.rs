//! Alias → account name → public key, kept per account on disk.
//!
//! Lookups are linear and the first match wins. Several entries may share a
//! canonical name (one person under two aliases); duplicate aliases are
//! allowed and shadow later ones.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub alias: String,
    /// Account name on the relay
    pub name: String,
    /// Cached hex public key, empty until looked up
    #[serde(default)]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    /// Account this book belongs to
    #[serde(default)]
    pub owner: String,
    /// Relay the owner is registered with
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub entries: Vec<AddressBookEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddressBookError {
    #[error("contact name must not be empty")]
    EmptyName,
    #[error("public key must not be empty")]
    EmptyKey,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl AddressBook {
    pub fn new(owner: &str, url: &str) -> Self {
        Self {
            owner: owner.to_string(),
            url: url.to_string(),
            entries: Vec::new(),
        }
    }

    /// Append a contact. An empty alias falls back to the name.
    pub fn add_entry(&mut self, name: &str, alias: &str) -> Result<(), AddressBookError> {
        if name.is_empty() {
            return Err(AddressBookError::EmptyName);
        }
        let alias = if alias.is_empty() { name } else { alias };
        self.entries.push(AddressBookEntry {
            alias: alias.to_string(),
            name: name.to_string(),
            public_key: String::new(),
            avatar: None,
        });
        Ok(())
    }

    /// Drop the first entry for `name`. Missing names are ignored.
    pub fn delete_entry(&mut self, name: &str) {
        if let Some(index) = self.entries.iter().position(|e| e.name == name) {
            self.entries.remove(index);
        }
    }

    /// Cache `public_key` on every entry for `name`.
    pub fn add_key(&mut self, name: &str, public_key: &str) -> Result<(), AddressBookError> {
        if name.is_empty() {
            return Err(AddressBookError::EmptyName);
        }
        if public_key.is_empty() {
            return Err(AddressBookError::EmptyKey);
        }
        for entry in self.entries.iter_mut().filter(|e| e.name == name) {
            entry.public_key = public_key.to_string();
        }
        Ok(())
    }

    pub fn pubkey_by_alias(&self, alias: &str) -> &str {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .map(|e| e.public_key.as_str())
            .unwrap_or("")
    }

    pub fn pubkey_by_name(&self, name: &str) -> &str {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.public_key.as_str())
            .unwrap_or("")
    }

    pub fn name_by_alias(&self, alias: &str) -> &str {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .map(|e| e.name.as_str())
            .unwrap_or("")
    }

    /// `(name, alias)` pairs in insertion order.
    pub fn list(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.alias.clone()))
            .collect()
    }

    pub fn entry_by_public_key(&self, public_key: &str) -> Option<&AddressBookEntry> {
        if public_key.is_empty() {
            return None;
        }
        self.entries.iter().find(|e| e.public_key == public_key)
    }

    pub fn load(path: &Path) -> Result<Self, AddressBookError> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), AddressBookError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, toml::to_string_pretty(self)?)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "5f0c7a4e2b1d9c8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e";

    #[test]
    fn add_key_delete_cycle() {
        let mut book = AddressBook::new("owner", "http://relay.test");
        book.add_entry("4kXvQ2p", "alice").unwrap();
        assert_eq!(book.name_by_alias("alice"), "4kXvQ2p");
        assert_eq!(book.pubkey_by_alias("alice"), "");

        book.add_key("4kXvQ2p", KEY).unwrap();
        assert_eq!(book.pubkey_by_alias("alice"), KEY);
        assert_eq!(book.pubkey_by_name("4kXvQ2p"), KEY);

        book.delete_entry("4kXvQ2p");
        assert_eq!(book.pubkey_by_alias("alice"), "");
        assert_eq!(book.name_by_alias("alice"), "");
        assert!(book.entries.is_empty());
    }

    #[test]
    fn alias_defaults_to_name() {
        let mut book = AddressBook::default();
        book.add_entry("4kXvQ2p", "").unwrap();
        assert_eq!(book.list(), vec![("4kXvQ2p".to_string(), "4kXvQ2p".to_string())]);
    }

    #[test]
    fn empty_inputs_rejected() {
        let mut book = AddressBook::default();
        assert!(matches!(
            book.add_entry("", "alice"),
            Err(AddressBookError::EmptyName)
        ));
        assert!(matches!(
            book.add_key("", KEY),
            Err(AddressBookError::EmptyName)
        ));
        assert!(matches!(
            book.add_key("4kXvQ2p", ""),
            Err(AddressBookError::EmptyKey)
        ));
    }

    #[test]
    fn key_lands_on_every_alias_of_a_name() {
        let mut book = AddressBook::default();
        book.add_entry("4kXvQ2p", "alice").unwrap();
        book.add_entry("9RmT3wq", "bob").unwrap();
        book.add_entry("4kXvQ2p", "al").unwrap();
        book.add_key("4kXvQ2p", KEY).unwrap();

        assert_eq!(book.pubkey_by_alias("alice"), KEY);
        assert_eq!(book.pubkey_by_alias("al"), KEY);
        assert_eq!(book.pubkey_by_alias("bob"), "");
        assert_eq!(book.entry_by_public_key(KEY).unwrap().alias, "alice");
        assert!(book.entry_by_public_key("").is_none());

        // only the first entry for the name goes
        book.delete_entry("4kXvQ2p");
        assert_eq!(
            book.list(),
            vec![
                ("9RmT3wq".to_string(), "bob".to_string()),
                ("4kXvQ2p".to_string(), "al".to_string()),
            ]
        );
        book.delete_entry("missing");
        assert_eq!(book.entries.len(), 2);
    }

    #[test]
    fn duplicate_alias_first_wins() {
        let mut book = AddressBook::default();
        book.add_entry("4kXvQ2p", "sam").unwrap();
        book.add_entry("9RmT3wq", "sam").unwrap();
        assert_eq!(book.name_by_alias("sam"), "4kXvQ2p");
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("addressbook.toml");

        let mut book = AddressBook::new("owner", "http://relay.test/");
        book.add_entry("4kXvQ2p", "alice").unwrap();
        book.add_key("4kXvQ2p", KEY).unwrap();
        book.add_entry("9RmT3wq", "").unwrap();
        book.entries[1].avatar = Some(vec![1, 2, 3]);
        book.save(&path).unwrap();

        assert_eq!(AddressBook::load(&path).unwrap(), book);
    }
}
