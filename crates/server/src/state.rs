use std::{fs, path::PathBuf};

use common::blob_id::BlobIdScheme;
use common::crypto::SecretKey;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "sealdrop-server";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const USERS_FILE_NAME: &str = "users.json";
pub const DATA_DIR_NAME: &str = "data";
pub const VAULT_DIR_NAME: &str = "vault";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the relay listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Where `GET /` redirects to
    #[serde(default = "default_homepage")]
    pub homepage: String,
    /// Blob id length for new uploads
    #[serde(default)]
    pub blob_id: BlobIdScheme,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for rolling log files (stdout only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_homepage() -> String {
    "https://github.com/sealdrop/sealdrop".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            homepage: default_homepage(),
            blob_id: BlobIdScheme::default(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

/// The relay's state directory (`~/.sealdrop-server` unless overridden).
#[derive(Debug, Clone)]
pub struct ServerState {
    pub server_dir: PathBuf,
    /// Relay identity key, signs registration responses
    pub key_path: PathBuf,
    pub users_path: PathBuf,
    pub data_path: PathBuf,
    pub vault_path: PathBuf,
    pub config_path: PathBuf,
    pub config: ServerConfig,
}

impl ServerState {
    pub fn server_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    fn layout(server_dir: PathBuf, config: ServerConfig) -> Self {
        Self {
            key_path: server_dir.join(KEY_FILE_NAME),
            users_path: server_dir.join(USERS_FILE_NAME),
            data_path: server_dir.join(DATA_DIR_NAME),
            vault_path: server_dir.join(VAULT_DIR_NAME),
            config_path: server_dir.join(CONFIG_FILE_NAME),
            server_dir,
            config,
        }
    }

    /// Create the directory tree, a fresh identity key and a config file.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<ServerConfig>,
    ) -> Result<Self, StateError> {
        let server_dir = Self::server_dir(custom_path)?;

        if server_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let state = Self::layout(server_dir, config.unwrap_or_default());
        fs::create_dir_all(&state.server_dir)?;
        fs::create_dir_all(&state.data_path)?;
        fs::create_dir_all(&state.vault_path)?;

        let key = SecretKey::generate();
        fs::write(&state.key_path, key.to_pem())?;

        fs::write(&state.config_path, toml::to_string_pretty(&state.config)?)?;

        Ok(state)
    }

    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let server_dir = Self::server_dir(custom_path)?;

        if !server_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = server_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        let config: ServerConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        let state = Self::layout(server_dir, config);
        if !state.key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        // stores are recreated if someone cleared them out
        fs::create_dir_all(&state.data_path)?;
        fs::create_dir_all(&state.vault_path)?;

        Ok(state)
    }

    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("server directory not initialized. Run 'sealdrop-server init' first")]
    NotInitialized,

    #[error("server directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
