//! Per-recipient inboxes of sealed envelopes.
//!
//! Layout: `<root>/<namespace>/<blob_id>`. Every recipient gets their own
//! copy, and a copy is gone the moment it has been read once.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use common::blob_id::{self, BlobIdScheme};
use common::identifier;

use crate::directory::{DirectoryError, UserDirectory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub blob_id: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    pub blob_id: String,
    /// recipients that actually got a copy
    pub stored_for: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no known recipients in request")]
    NoRecipients,
    #[error("{requester} may not read from {namespace}")]
    Unauthorized { requester: String, namespace: String },
    #[error("blob not found")]
    NotFound,
    #[error("invalid path component: {0}")]
    InvalidPath(String),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
    scheme: BlobIdScheme,
    lock: RwLock<()>,
}

fn check_namespace(namespace: &str) -> Result<(), StoreError> {
    if identifier::verify(namespace) {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(namespace.to_string()))
    }
}

fn check_blob_id(id: &str) -> Result<(), StoreError> {
    if blob_id::is_valid(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(id.to_string()))
    }
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>, scheme: BlobIdScheme) -> Self {
        Self {
            root: root.into(),
            scheme,
            lock: RwLock::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, namespace: &str, id: &str) -> PathBuf {
        self.root.join(namespace).join(id)
    }

    /// Store one copy of `data` for every recipient the directory knows.
    pub fn upload(
        &self,
        directory: &UserDirectory,
        recipients: &[String],
        data: &[u8],
    ) -> Result<Deposit, StoreError> {
        let id = self.scheme.derive(data);

        let mut stored_for = Vec::new();
        let mut skipped = Vec::new();
        for name in recipients {
            if stored_for.contains(name) {
                continue;
            }
            if !identifier::verify(name) || !directory.lookup(name)? {
                tracing::warn!(recipient = %name, "skipping unknown recipient");
                skipped.push(name.clone());
                continue;
            }
            stored_for.push(name.clone());
        }

        if stored_for.is_empty() {
            return Err(StoreError::NoRecipients);
        }

        let _guard = self.lock.write();
        for name in &stored_for {
            let dir = self.root.join(name);
            fs::create_dir_all(&dir)?;
            fs::write(dir.join(&id), data)?;
        }

        tracing::info!(blob_id = %id, recipients = stored_for.len(), "stored blob");
        Ok(Deposit {
            blob_id: id,
            stored_for,
            skipped,
        })
    }

    /// Hand back the copy in `namespace` and erase it.
    ///
    /// The erase happens before the caller has delivered the bytes anywhere,
    /// so a failed delivery loses the copy.
    pub fn download(
        &self,
        namespace: &str,
        id: &str,
        requester: &str,
    ) -> Result<Vec<u8>, StoreError> {
        if requester != namespace {
            return Err(StoreError::Unauthorized {
                requester: requester.to_string(),
                namespace: namespace.to_string(),
            });
        }
        check_namespace(namespace)?;
        check_blob_id(id)?;

        let path = self.blob_path(namespace, id);
        let _guard = self.lock.write();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound)
            }
            Err(e) => return Err(e.into()),
        };
        fs::remove_file(&path)?;

        tracing::info!(blob_id = %id, namespace = %namespace, "blob delivered and erased");
        Ok(data)
    }

    /// Everything waiting in `namespace`, oldest first.
    pub fn list(&self, namespace: &str) -> Result<Vec<BlobInfo>, StoreError> {
        check_namespace(namespace)?;

        let _guard = self.lock.read();
        let entries = match fs::read_dir(self.root.join(namespace)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut blobs = Vec::new();
        for entry in entries {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let blob_id = entry.file_name().to_string_lossy().to_string();
            if !blob_id::is_valid(&blob_id) {
                continue;
            }
            blobs.push(BlobInfo {
                blob_id,
                size: metadata.len(),
                modified: DateTime::<Utc>::from(metadata.modified()?),
            });
        }
        blobs.sort_by(|a, b| a.modified.cmp(&b.modified).then(a.blob_id.cmp(&b.blob_id)));
        Ok(blobs)
    }
}
