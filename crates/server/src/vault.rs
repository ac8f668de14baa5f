//! One encrypted backup slot per account.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::directory::{DirectoryError, UserDirectory};

const SLOT_FILE_NAME: &str = "config";

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("no config stored for {0}")]
    Empty(String),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ConfigVault {
    root: PathBuf,
    lock: RwLock<()>,
}

impl ConfigVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // only names the directory vouches for become paths
    fn slot(&self, directory: &UserDirectory, name: &str) -> Result<PathBuf, VaultError> {
        if !UserDirectory::verify_identifier(name) || !directory.lookup(name)? {
            return Err(VaultError::UnknownAccount(name.to_string()));
        }
        Ok(self.root.join(name).join(SLOT_FILE_NAME))
    }

    /// Overwrite the slot for `name` with `data`.
    pub fn put(
        &self,
        directory: &UserDirectory,
        name: &str,
        data: &[u8],
    ) -> Result<(), VaultError> {
        let path = self.slot(directory, name)?;
        let _guard = self.lock.write();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        tracing::debug!(name = %name, size = data.len(), "config stored");
        Ok(())
    }

    pub fn get(&self, directory: &UserDirectory, name: &str) -> Result<Vec<u8>, VaultError> {
        let path = self.slot(directory, name)?;
        let _guard = self.lock.read();
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(VaultError::Empty(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
