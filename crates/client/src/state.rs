use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use common::crypto::{PublicKey, SecretKey};
use common::identifier;

use crate::addressbook::{AddressBook, AddressBookError};

pub const APP_DIR: &str = ".config/sealdrop/client";
pub const CURRENT_FILE_NAME: &str = "current";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const ADDRESSBOOK_FILE_NAME: &str = "addressbook.toml";

pub const DEFAULT_RELAY_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Per-account client settings, stored as `<name>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Relay base URL
    pub url: Url,
    /// Account name assigned by the relay
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_token: Option<String>,
    /// Relay identity registration responses must be signed by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key: Option<String>,
    /// http, https, socks5 or socks5h proxy for every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Url>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    /// Fresh, not yet registered config for `url`.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            name: String::new(),
            api_token: String::new(),
            machine_id: None,
            machine_token: None,
            server_key: None,
            proxy: None,
            insecure_skip_verify: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(self.url.scheme().to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(proxy) = &self.proxy {
            if !matches!(proxy.scheme(), "http" | "https" | "socks5" | "socks5h") {
                return Err(ConfigError::UnsupportedProxy(proxy.to_string()));
            }
        }
        if let Some(key) = &self.server_key {
            PublicKey::from_hex(key).map_err(|_| ConfigError::InvalidServerKey)?;
        }
        if !self.name.is_empty() {
            if !identifier::verify(&self.name) {
                return Err(ConfigError::InvalidName(self.name.clone()));
            }
            if self.api_token.is_empty() {
                return Err(ConfigError::MissingToken);
            }
        }
        Ok(())
    }

    pub fn server_key(&self) -> Result<Option<PublicKey>, ConfigError> {
        self.server_key
            .as_deref()
            .map(|key| PublicKey::from_hex(key).map_err(|_| ConfigError::InvalidServerKey))
            .transpose()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("relay url must be http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("timeout_secs must be positive")]
    ZeroTimeout,
    #[error("unsupported proxy: {0}")]
    UnsupportedProxy(String),
    #[error("server_key is not a valid public key")]
    InvalidServerKey,
    #[error("invalid account name: {0}")]
    InvalidName(String),
    #[error("account has a name but no api token")]
    MissingToken,
}

/// The client's state root (`~/.config/sealdrop/client` unless overridden).
///
/// Holds one directory per registered account and a `current` file naming
/// the account commands act as.
#[derive(Debug, Clone)]
pub struct ClientState {
    pub root: PathBuf,
}

impl ClientState {
    pub fn root_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(APP_DIR))
    }

    pub fn open(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        Ok(Self {
            root: Self::root_dir(custom_path)?,
        })
    }

    /// Name of the active account, if one was ever selected.
    pub fn current(&self) -> Result<Option<String>, StateError> {
        let path = self.root.join(CURRENT_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let name = fs::read_to_string(path)?.trim().to_string();
        Ok((!name.is_empty()).then_some(name))
    }

    pub fn set_current(&self, name: &str) -> Result<(), StateError> {
        if !self.root.join(name).is_dir() {
            return Err(StateError::UnknownAccount(name.to_string()));
        }
        fs::write(self.root.join(CURRENT_FILE_NAME), format!("{}\n", name))?;
        Ok(())
    }

    /// Persist a freshly registered account and make it current.
    pub fn create_account(
        &self,
        config: ClientConfig,
        key: &SecretKey,
        book: &AddressBook,
    ) -> Result<AccountState, StateError> {
        config.validate()?;
        if config.name.is_empty() {
            return Err(StateError::Unregistered);
        }
        let account = AccountState::layout(self.root.join(&config.name), config);
        if account.config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&account.dir)?;
        fs::write(&account.key_path, key.to_pem())?;
        account.save_config()?;
        book.save(&account.addressbook_path)?;

        self.set_current(&account.config.name)?;
        Ok(account)
    }

    pub fn load_current(&self) -> Result<AccountState, StateError> {
        let name = self.current()?.ok_or(StateError::NotInitialized)?;
        self.load_account(&name)
    }

    pub fn load_account(&self, name: &str) -> Result<AccountState, StateError> {
        AccountState::load(self.root.join(name))
    }

    /// Names of every account directory under the root.
    pub fn accounts(&self) -> Result<Vec<String>, StateError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join(CONFIG_FILE_NAME).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// One account's directory: config, key and address book.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub dir: PathBuf,
    pub config_path: PathBuf,
    pub key_path: PathBuf,
    pub addressbook_path: PathBuf,
    pub config: ClientConfig,
}

impl AccountState {
    fn layout(dir: PathBuf, config: ClientConfig) -> Self {
        Self {
            config_path: dir.join(CONFIG_FILE_NAME),
            key_path: dir.join(KEY_FILE_NAME),
            addressbook_path: dir.join(ADDRESSBOOK_FILE_NAME),
            dir,
            config,
        }
    }

    pub fn load(dir: PathBuf) -> Result<Self, StateError> {
        if !dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        let config: ClientConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;
        config.validate()?;

        let state = Self::layout(dir, config);
        if !state.key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        Ok(state)
    }

    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// The saved address book, or an empty one owned by this account.
    pub fn load_addressbook(&self) -> Result<AddressBook, StateError> {
        if !self.addressbook_path.exists() {
            return Ok(AddressBook::new(
                &self.config.name,
                self.config.url.as_str(),
            ));
        }
        Ok(AddressBook::load(&self.addressbook_path)?)
    }

    pub fn save_addressbook(&self, book: &AddressBook) -> Result<(), StateError> {
        Ok(book.save(&self.addressbook_path)?)
    }

    pub fn save_config(&self) -> Result<(), StateError> {
        write_atomic(
            &self.config_path,
            toml::to_string_pretty(&self.config)?.as_bytes(),
        )
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StateError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(tmp, path)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("no account set up. Run 'sealdrop register' first")]
    NotInitialized,

    #[error("account already exists")]
    AlreadyInitialized,

    #[error("account has no name; registration did not complete")]
    Unregistered,

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("address book error: {0}")]
    AddressBook(#[from] AddressBookError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registered_config() -> ClientConfig {
        ClientConfig {
            name: identifier::generate(),
            api_token: "00ff".into(),
            ..ClientConfig::new(Url::parse("http://relay.test:8080").unwrap())
        }
    }

    #[test]
    fn create_then_load_current() {
        let dir = TempDir::new().unwrap();
        let state = ClientState::open(Some(dir.path().to_path_buf())).unwrap();
        assert!(state.current().unwrap().is_none());
        assert!(matches!(
            state.load_current(),
            Err(StateError::NotInitialized)
        ));

        let config = registered_config();
        let key = SecretKey::generate();
        let book = AddressBook::new(&config.name, config.url.as_str());
        state.create_account(config.clone(), &key, &book).unwrap();

        assert_eq!(state.current().unwrap(), Some(config.name.clone()));
        let account = state.load_current().unwrap();
        assert_eq!(account.config, config);
        assert_eq!(account.load_key().unwrap().public(), key.public());
        assert_eq!(account.load_addressbook().unwrap(), book);
        assert_eq!(state.accounts().unwrap(), vec![config.name.clone()]);

        assert!(matches!(
            state.create_account(config, &key, &book),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn set_current_requires_account() {
        let dir = TempDir::new().unwrap();
        let state = ClientState::open(Some(dir.path().to_path_buf())).unwrap();
        assert!(matches!(
            state.set_current("nobody"),
            Err(StateError::UnknownAccount(_))
        ));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("url = \"https://relay.test/\"").unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.insecure_skip_verify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let base = registered_config();
        assert!(base.validate().is_ok());

        let ftp = ClientConfig {
            url: Url::parse("ftp://relay.test").unwrap(),
            ..base.clone()
        };
        assert!(matches!(
            ftp.validate(),
            Err(ConfigError::UnsupportedScheme(_))
        ));

        let zero = ClientConfig {
            timeout_secs: 0,
            ..base.clone()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroTimeout)));

        let proxy = ClientConfig {
            proxy: Some(Url::parse("ftp://proxy:21").unwrap()),
            ..base.clone()
        };
        assert!(matches!(
            proxy.validate(),
            Err(ConfigError::UnsupportedProxy(_))
        ));

        let socks = ClientConfig {
            proxy: Some(Url::parse("socks5h://127.0.0.1:9050").unwrap()),
            ..base.clone()
        };
        assert!(socks.validate().is_ok());

        let pinned = ClientConfig {
            server_key: Some("zz".into()),
            ..base.clone()
        };
        assert!(matches!(
            pinned.validate(),
            Err(ConfigError::InvalidServerKey)
        ));

        let tokenless = ClientConfig {
            api_token: String::new(),
            ..base
        };
        assert!(matches!(
            tokenless.validate(),
            Err(ConfigError::MissingToken)
        ));
    }
}
