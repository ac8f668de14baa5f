//! Encrypt-then-upload and download-then-decrypt for one account session.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use common::crypto::{Envelope, EnvelopeError, PublicKey, SecretKey};
use common::keyring::{Keyring, KeyringError, MemoryKeyring};
use common::protocol::CONFIG_BACKUP_FILENAME;

use crate::addressbook::{AddressBook, AddressBookError};
use crate::api::{ApiError, Relay};
use crate::state::ClientConfig;

pub const LIST_HEADER: &str = "blob id  size, received";

/// What an upload resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub blob_id: String,
    /// Account names the envelope was deposited for
    pub recipients: Vec<String>,
    /// Aliases that could not be resolved to a key
    pub skipped: Vec<String>,
}

/// A decrypted download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub sender: PublicKey,
    /// Alias of the sender if their key is in the address book
    pub sender_alias: Option<String>,
    pub filename: String,
    pub contents: Vec<u8>,
}

/// A download written to disk by [`TransferClient::receive_into`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub path: PathBuf,
    pub received: Received,
}

/// Client state pushed to the config vault, sealed to the account's own key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigBackup {
    pub config: ClientConfig,
    pub addressbook: AddressBook,
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("no recipient keys could be found")]
    NoRecipients,
    #[error("backup was not sealed by this account")]
    ForeignBackup,
    #[error("relay error: {0}")]
    Api(#[from] ApiError),
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("keyring error: {0}")]
    Keyring(#[from] KeyringError),
    #[error("address book error: {0}")]
    AddressBook(#[from] AddressBookError),
    #[error("backup encoding error: {0}")]
    Backup(#[from] serde_json::Error),
    #[error("cannot write into {0:?}: {1}")]
    OutDir(PathBuf, std::io::Error),
    #[error("could not save {path:?}: {source} (decrypted copy kept at {kept:?})")]
    Save {
        path: PathBuf,
        kept: Option<PathBuf>,
        source: std::io::Error,
    },
}

/// Last path component of a sender supplied filename.
pub fn safe_filename(name: &str, fallback: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .unwrap_or_else(|| fallback.to_string())
}

/// Fill the staged file and move it to `path`.
///
/// On failure the contents survive either as the kept staging file or as a
/// copy in the system temp directory.
fn persist_staged(
    mut staged: NamedTempFile,
    path: &Path,
    contents: &[u8],
    blob_id: &str,
) -> Result<(), TransferError> {
    let written = staged
        .write_all(contents)
        .and_then(|_| staged.as_file().sync_all());
    if let Err(source) = written {
        let rescue = std::env::temp_dir().join(format!("sealdrop-{}", blob_id));
        let kept = std::fs::write(&rescue, contents).ok().map(|_| rescue);
        return Err(TransferError::Save {
            path: path.to_path_buf(),
            kept,
            source,
        });
    }

    staged.persist(path).map_err(|e| TransferError::Save {
        path: path.to_path_buf(),
        kept: e.file.keep().ok().map(|(_, kept)| kept),
        source: e.error,
    })?;
    Ok(())
}

/// One account's view of the relay.
///
/// Owns the address book for the session; keys learned from the relay are
/// cached in it and persisted with [`TransferClient::save_addressbook`].
pub struct TransferClient<R> {
    relay: R,
    book: AddressBook,
    keyring: Box<dyn Keyring>,
    identity: PublicKey,
}

impl<R: Relay> TransferClient<R> {
    /// Session for `key`, held in a fresh in-memory keyring.
    pub fn new(relay: R, book: AddressBook, key: SecretKey) -> Result<Self, TransferError> {
        let identity = key.public();
        let mut keyring = MemoryKeyring::new();
        keyring.add(key, &book.owner)?;
        Ok(Self::with_keyring(relay, book, Box::new(keyring), identity))
    }

    pub fn with_keyring(
        relay: R,
        book: AddressBook,
        keyring: Box<dyn Keyring>,
        identity: PublicKey,
    ) -> Self {
        Self {
            relay,
            book,
            keyring,
            identity,
        }
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    pub fn identity(&self) -> &PublicKey {
        &self.identity
    }

    pub fn book(&self) -> &AddressBook {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut AddressBook {
        &mut self.book
    }

    pub fn keyring_mut(&mut self) -> &mut dyn Keyring {
        self.keyring.as_mut()
    }

    fn secret_key(&self) -> Result<SecretKey, TransferError> {
        Ok(self.keyring.get(&self.identity)?)
    }

    /// Ask the relay for `name`'s key and cache it if it parses.
    async fn fetch_key(&mut self, name: &str) -> Result<Option<PublicKey>, TransferError> {
        let found = match self.relay.lookup_key(name).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(name, error = %e, "key lookup failed");
                return Ok(None);
            }
        };
        match PublicKey::from_hex(&found) {
            Ok(key) => {
                self.book.add_key(name, &key.to_hex())?;
                Ok(Some(key))
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "relay returned an unusable key");
                Ok(None)
            }
        }
    }

    /// Seal `plaintext` to every alias in the comma-separated `recipients`
    /// and deposit it on the relay.
    ///
    /// Aliases without a book entry are skipped without touching the
    /// network. Entries without a cached key are looked up on the relay.
    /// Fails only if nothing resolves.
    pub async fn upload_file(
        &mut self,
        recipients: &str,
        filename: &str,
        plaintext: &[u8],
    ) -> Result<UploadReceipt, TransferError> {
        let mut names = Vec::new();
        let mut keys = Vec::new();
        let mut skipped = Vec::new();

        for alias in recipients.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            let name = self.book.name_by_alias(alias).to_string();
            if name.is_empty() {
                tracing::warn!(alias, "not in address book, skipping");
                skipped.push(alias.to_string());
                continue;
            }

            let cached = self.book.pubkey_by_alias(alias);
            let key = if cached.is_empty() {
                self.fetch_key(&name).await?
            } else {
                PublicKey::from_hex(cached).ok()
            };

            match key {
                Some(public_key) => {
                    names.push(name);
                    keys.push(public_key);
                }
                None => {
                    tracing::warn!(alias, name = %name, "no usable public key, skipping");
                    skipped.push(alias.to_string());
                }
            }
        }

        if keys.is_empty() {
            return Err(TransferError::NoRecipients);
        }

        let sender = self.secret_key()?;
        let sealed = Envelope::seal(&sender, &keys, filename, plaintext)?;
        let blob_id = self.relay.upload(&names, sealed).await?;
        tracing::info!(blob_id = %blob_id, recipients = names.len(), "uploaded");

        Ok(UploadReceipt {
            blob_id,
            recipients: names,
            skipped,
        })
    }

    /// Fetch `blob_id` from the account's own namespace and open it.
    ///
    /// The relay erases the blob as it hands it over. The sender key is
    /// reported, not checked against the address book.
    pub async fn download_file(&self, blob_id: &str) -> Result<Received, TransferError> {
        let data = self.relay.download(&self.book.owner, blob_id).await?;
        let opened = Envelope::open(&self.secret_key()?, &data)?;
        let sender_alias = self
            .book
            .entry_by_public_key(&opened.sender.to_hex())
            .map(|e| e.alias.clone());

        Ok(Received {
            sender: opened.sender,
            sender_alias,
            filename: opened.filename,
            contents: opened.contents,
        })
    }

    /// Download `blob_id` and save it under `out`.
    ///
    /// The relay erases its copy on delivery, so `out` is checked for
    /// writability before anything is fetched. If the final write still
    /// fails, the decrypted bytes are left in a file named by the error.
    pub async fn receive_into(&self, blob_id: &str, out: &Path) -> Result<Saved, TransferError> {
        let staged = tempfile::Builder::new()
            .prefix(".sealdrop-")
            .suffix(".part")
            .tempfile_in(out)
            .map_err(|e| TransferError::OutDir(out.to_path_buf(), e))?;

        let received = self.download_file(blob_id).await?;
        let path = out.join(safe_filename(&received.filename, blob_id));
        persist_staged(staged, &path, &received.contents, blob_id)?;
        tracing::info!(blob_id, path = %path.display(), "saved");

        Ok(Saved { path, received })
    }

    /// The relay's listing of waiting blobs under a header line.
    pub async fn list_files(&self) -> Result<String, TransferError> {
        let listing = self.relay.list().await?;
        let mut table = String::from(LIST_HEADER);
        for row in listing.lines().filter(|l| !l.trim().is_empty()) {
            table.push('\n');
            table.push_str(row);
        }
        Ok(table)
    }

    pub fn save_addressbook(&self, path: &Path) -> Result<(), TransferError> {
        Ok(self.book.save(path)?)
    }

    /// Seal `config` plus the address book to ourselves and store it on the relay.
    pub async fn push_config(&self, config: &ClientConfig) -> Result<(), TransferError> {
        let backup = ConfigBackup {
            config: config.clone(),
            addressbook: self.book.clone(),
        };
        let sealed = Envelope::seal(
            &self.secret_key()?,
            &[self.identity],
            CONFIG_BACKUP_FILENAME,
            &serde_json::to_vec(&backup)?,
        )?;
        self.relay.push_config(&self.book.owner, sealed).await?;
        Ok(())
    }

    /// Restore the backup left by [`TransferClient::push_config`].
    ///
    /// The address book is replaced; the caller decides what to do with the config.
    pub async fn pull_config(&mut self) -> Result<ClientConfig, TransferError> {
        let data = self.relay.pull_config(&self.book.owner).await?;
        let opened = Envelope::open(&self.secret_key()?, &data)?;
        if opened.sender != self.identity {
            return Err(TransferError::ForeignBackup);
        }
        let backup: ConfigBackup = serde_json::from_slice(&opened.contents)?;
        self.book = backup.addressbook;
        Ok(backup.config)
    }
}
