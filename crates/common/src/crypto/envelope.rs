//! Multi-recipient sealed file format.
//!
//! ```text
//! Envelope {
//!     header: { version, sender, recipients: [(recipient, share)] },
//!     payload: Secret::encrypt(bincode({ filename, contents })),
//!     signature: ed25519(sender, bincode(header) || payload),
//! }
//! ```
//!
//! The relay only ever sees the bincode encoding of this struct.

use serde::{Deserialize, Serialize};

use super::keys::{PublicKey, SecretKey};
use super::secret::{Secret, SecretError};
use super::secret_share::{SecretShare, SecretShareError};
use super::Signature;

pub const ENVELOPE_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("envelope needs at least one recipient")]
    NoRecipients,
    #[error("not a recipient of this envelope")]
    NotARecipient,
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),
    #[error("sender signature does not verify")]
    BadSignature,
    #[error("malformed envelope: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("share error: {0}")]
    Share(#[from] SecretShareError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecipientShare {
    recipient: PublicKey,
    share: SecretShare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    version: u8,
    sender: PublicKey,
    recipients: Vec<RecipientShare>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    filename: String,
    contents: Vec<u8>,
}

/// A file sealed to a set of recipient keys and signed by its sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    header: Header,
    payload: Vec<u8>,
    signature: Signature,
}

/// What a recipient gets back out of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    pub sender: PublicKey,
    pub filename: String,
    pub contents: Vec<u8>,
}

fn signed_bytes(header: &Header, payload: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let mut msg = bincode::serialize(header)?;
    msg.extend_from_slice(payload);
    Ok(msg)
}

impl Envelope {
    /// Encrypt `contents` to every key in `recipients` and return the wire bytes.
    ///
    /// Duplicate recipient keys are collapsed to one share.
    pub fn seal(
        sender: &SecretKey,
        recipients: &[PublicKey],
        filename: &str,
        contents: &[u8],
    ) -> Result<Vec<u8>, EnvelopeError> {
        if recipients.is_empty() {
            return Err(EnvelopeError::NoRecipients);
        }

        let secret = Secret::generate();
        let mut shares: Vec<RecipientShare> = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            if shares.iter().any(|s| &s.recipient == recipient) {
                continue;
            }
            shares.push(RecipientShare {
                recipient: *recipient,
                share: SecretShare::new(&secret, recipient)?,
            });
        }

        let payload = bincode::serialize(&Payload {
            filename: filename.to_string(),
            contents: contents.to_vec(),
        })?;
        let payload = secret.encrypt(&payload)?;

        let header = Header {
            version: ENVELOPE_VERSION,
            sender: sender.public(),
            recipients: shares,
        };
        let signature = sender.sign(&signed_bytes(&header, &payload)?);

        let envelope = Envelope {
            header,
            payload,
            signature,
        };
        Ok(bincode::serialize(&envelope)?)
    }

    /// Parse wire bytes without decrypting anything.
    pub fn decode(data: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope: Envelope = bincode::deserialize(data)?;
        if envelope.header.version != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(envelope.header.version));
        }
        Ok(envelope)
    }

    pub fn sender(&self) -> &PublicKey {
        &self.header.sender
    }

    pub fn recipients(&self) -> impl Iterator<Item = &PublicKey> {
        self.header.recipients.iter().map(|r| &r.recipient)
    }

    /// Verify the sender signature, unwrap our share and decrypt the payload.
    pub fn open_with(&self, recipient: &SecretKey) -> Result<Opened, EnvelopeError> {
        let msg = signed_bytes(&self.header, &self.payload)?;
        self.header
            .sender
            .verify(&msg, &self.signature)
            .map_err(|_| EnvelopeError::BadSignature)?;

        let me = recipient.public();
        let share = self
            .header
            .recipients
            .iter()
            .find(|r| r.recipient == me)
            .ok_or(EnvelopeError::NotARecipient)?;

        let secret = share.share.recover(recipient)?;
        let payload: Payload = bincode::deserialize(&secret.decrypt(&self.payload)?)?;

        Ok(Opened {
            sender: self.header.sender,
            filename: payload.filename,
            contents: payload.contents,
        })
    }

    /// `decode` followed by `open_with`.
    pub fn open(recipient: &SecretKey, data: &[u8]) -> Result<Opened, EnvelopeError> {
        Self::decode(data)?.open_with(recipient)
    }
}
