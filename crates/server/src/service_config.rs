use std::net::SocketAddr;
use std::path::PathBuf;

use common::blob_id::BlobIdScheme;
use common::crypto::SecretKey;

use crate::state::{ServerState, StateError};

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    pub listen_addr: SocketAddr,
    /// where `GET /` redirects
    pub homepage: String,

    // storage configuration
    /// path to the account registry document
    pub users_path: PathBuf,
    /// root of the per-recipient inboxes
    pub data_path: PathBuf,
    /// root of the per-account config slots
    pub vault_path: PathBuf,
    pub blob_id: BlobIdScheme,

    // identity
    pub identity: SecretKey,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("invalid listen address: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
    #[error("invalid log level: {0}")]
    LogLevel(String),
}

impl Config {
    /// Build a runnable config from an initialized state directory.
    pub fn from_state(state: &ServerState) -> Result<Self, ConfigError> {
        let log_level = state
            .config
            .log_level
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::LogLevel(state.config.log_level.clone()))?;

        Ok(Self {
            listen_addr: state.config.listen_addr.parse()?,
            homepage: state.config.homepage.clone(),
            users_path: state.users_path.clone(),
            data_path: state.data_path.clone(),
            vault_path: state.vault_path.clone(),
            blob_id: state.config.blob_id,
            identity: state.load_key()?,
            log_level,
            log_dir: state.config.log_dir.clone(),
        })
    }
}
