use std::sync::Arc;

use tokio::task::JoinError;

use common::crypto::{PublicKey, SecretKey};

use super::directory::UserDirectory;
use super::service_config::Config;
use super::store::ContentStore;
use super::vault::ConfigVault;

/// Everything a request handler needs, cheap to clone into each request.
#[derive(Clone)]
pub struct State {
    directory: Arc<UserDirectory>,
    store: Arc<ContentStore>,
    vault: Arc<ConfigVault>,
    identity: Arc<SecretKey>,
    homepage: Arc<str>,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        for dir in [&config.data_path, &config.vault_path] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = config.users_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let directory = UserDirectory::open(&config.users_path);
        let store = ContentStore::new(&config.data_path, config.blob_id);
        let vault = ConfigVault::new(&config.vault_path);

        tracing::info!(
            identity = %config.identity.public(),
            blob_id = ?config.blob_id,
            "relay state ready"
        );

        Ok(Self {
            directory: Arc::new(directory),
            store: Arc::new(store),
            vault: Arc::new(vault),
            identity: Arc::new(config.identity.clone()),
            homepage: Arc::from(config.homepage.as_str()),
        })
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn vault(&self) -> &ConfigVault {
        &self.vault
    }

    pub fn identity(&self) -> &SecretKey {
        &self.identity
    }

    pub fn public_key(&self) -> PublicKey {
        self.identity.public()
    }

    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    /// Run file-backed storage work on the blocking pool.
    ///
    /// The directory, store and vault hold synchronous locks around
    /// `std::fs` calls, so handlers never call them on a runtime worker.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, JoinError>
    where
        F: FnOnce(&State) -> T + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state)).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to prepare storage directories: {0}")]
    Io(#[from] std::io::Error),
}
