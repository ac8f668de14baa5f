use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

pub const PRIVATE_KEY_SIZE: usize = 32;
pub const PUBLIC_KEY_SIZE: usize = 32;

const PEM_TAG: &str = "SEALDROP PRIVATE KEY";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("key is not valid hex")]
    InvalidHex,
    #[error("public key is not a valid curve point")]
    InvalidPoint,
    #[error("malformed PEM: {0}")]
    Pem(String),
    #[error("unexpected PEM block: {0}")]
    PemTag(String),
}

/// Public half of an account identity.
///
/// The relay stores it as lowercase hex next to the account name, the
/// address book caches the same string, and the envelope format embeds
/// the raw 32 bytes for the sender and for every recipient share.
///
/// # Examples
///
/// ```ignore
/// let secret_key = SecretKey::generate();
/// let public_key = secret_key.public();
///
/// let hex = public_key.to_hex();
/// let recovered = PublicKey::from_hex(&hex)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(VerifyingKey);

impl TryFrom<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Result<Self, Self::Error> {
        VerifyingKey::from_bytes(&bytes)
            .map(PublicKey)
            .map_err(|_| KeyError::InvalidPoint)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidLength(bytes.len()))?;
        bytes.try_into()
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Decode exactly 32 bytes of hex, tolerating whitespace and a `0x` prefix.
fn decode_key_hex(hex: &str) -> Result<[u8; 32], KeyError> {
    let hex = hex.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() != 64 {
        return Err(KeyError::InvalidLength(hex.len() / 2));
    }
    let mut buff = [0; 32];
    hex::decode_to_slice(hex, &mut buff).map_err(|_| KeyError::InvalidHex)?;
    Ok(buff)
}

impl PublicKey {
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        decode_key_hex(hex)?.try_into()
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Lowercase hex, the form the relay and address book store.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The Montgomery form of the point, for ECDH.
    #[allow(clippy::wrong_self_convention)]
    pub(crate) fn to_x25519(&self) -> Result<X25519PublicKey, KeyError> {
        let point = CompressedEdwardsY(self.to_bytes())
            .decompress()
            .ok_or(KeyError::InvalidPoint)?;
        Ok(X25519PublicKey::from(point.to_montgomery().to_bytes()))
    }

    /// Strict Ed25519 verification (rejects small-order and non-canonical forms).
    pub fn verify(
        &self,
        msg: &[u8],
        signature: &ed25519_dalek::Signature,
    ) -> Result<(), ed25519_dalek::SignatureError> {
        self.0.verify_strict(msg, signature)
    }
}

/// Private half of an account identity (or of the relay's own identity).
///
/// Lives in `key.pem` inside the owning state directory and is never sent
/// over the network.
#[derive(Debug, Clone)]
pub struct SecretKey(SigningKey);

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(SigningKey::from_bytes(&secret))
    }
}

impl SecretKey {
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Ok(Self::from(decode_key_hex(hex)?))
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        Self::from(bytes)
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// `key.pem` contents.
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PEM_TAG, self.to_bytes()))
    }

    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| KeyError::Pem(e.to_string()))?;
        if pem.tag() != PEM_TAG {
            return Err(KeyError::PemTag(pem.tag().to_string()));
        }
        let bytes: [u8; PRIVATE_KEY_SIZE] = pem
            .contents()
            .try_into()
            .map_err(|_| KeyError::InvalidLength(pem.contents().len()))?;
        Ok(Self::from(bytes))
    }

    /// The clamped Ed25519 scalar doubles as the X25519 private key.
    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0.to_scalar_bytes())
    }

    pub fn sign(&self, msg: &[u8]) -> ed25519_dalek::Signature {
        self.0.sign(msg)
    }
}
