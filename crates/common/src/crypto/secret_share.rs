//! Wrapping a file secret for one recipient: ephemeral X25519 ECDH followed
//! by AES Key Wrap (RFC 3394).
//!
//! The sender generates a throwaway Ed25519 keypair, converts it and the
//! recipient's identity key to X25519, and uses the shared point as the
//! key-encryption key. The recipient repeats the ECDH from their side with
//! the ephemeral public key stored at the front of the share.

use std::convert::TryFrom;

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Serialize};

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::secret::{Secret, SECRET_SIZE};

/// AES-KW integrity block added to the wrapped key
pub const KW_NONCE_SIZE: usize = 8;
/// `ephemeral_pubkey (32) || wrapped_secret (40)`
pub const SECRET_SHARE_SIZE: usize = PUBLIC_KEY_SIZE + SECRET_SIZE + KW_NONCE_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    #[error("share must be 72 bytes, got {0}")]
    InvalidLength(usize),
    #[error("could not wrap content key")]
    Wrap,
    /// Made for another key, or altered in transit.
    #[error("could not unwrap content key")]
    Unwrap,
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

/// A file secret wrapped for exactly one recipient key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SecretShare(pub(crate) [u8; SECRET_SHARE_SIZE]);

impl Serialize for SecretShare {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretShare {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};
        use std::fmt;

        struct ShareVisitor;

        impl<'de> Visitor<'de> for ShareVisitor {
            type Value = SecretShare;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "{} share bytes", SECRET_SHARE_SIZE)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                SecretShare::try_from(v).map_err(|_| E::invalid_length(v.len(), &self))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(SECRET_SHARE_SIZE);
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                SecretShare::try_from(bytes.as_slice())
                    .map_err(|_| A::Error::invalid_length(bytes.len(), &self))
            }
        }

        // bincode hands over bytes, JSON a sequence
        deserializer.deserialize_byte_buf(ShareVisitor)
    }
}

impl TryFrom<&[u8]> for SecretShare {
    type Error = SecretShareError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let share: [u8; SECRET_SHARE_SIZE] = bytes
            .try_into()
            .map_err(|_| SecretShareError::InvalidLength(bytes.len()))?;
        Ok(SecretShare(share))
    }
}

impl SecretShare {
    /// Wrap `secret` so only the holder of `recipient`'s secret key can unwrap it.
    pub fn new(secret: &Secret, recipient: &PublicKey) -> Result<Self, SecretShareError> {
        let ephemeral = SecretKey::generate();
        let kek = Kek::from(
            *ephemeral
                .to_x25519()
                .diffie_hellman(&recipient.to_x25519()?)
                .as_bytes(),
        );

        let mut share = [0u8; SECRET_SHARE_SIZE];
        share[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral.public().to_bytes());
        kek.wrap(secret.bytes(), &mut share[PUBLIC_KEY_SIZE..])
            .map_err(|_| SecretShareError::Wrap)?;

        Ok(SecretShare(share))
    }

    /// Unwrap the file secret with the recipient's identity key.
    ///
    /// An error here means the share was made for another key or was
    /// altered in transit; AES-KW carries its own integrity check.
    pub fn recover(&self, recipient_secret: &SecretKey) -> Result<Secret, SecretShareError> {
        let (ephemeral, wrapped) = self.0.split_at(PUBLIC_KEY_SIZE);
        let ephemeral = PublicKey::try_from(ephemeral)?;
        let kek = Kek::from(
            *recipient_secret
                .to_x25519()
                .diffie_hellman(&ephemeral.to_x25519()?)
                .as_bytes(),
        );

        let mut unwrapped = [0u8; SECRET_SIZE];
        kek.unwrap(wrapped, &mut unwrapped)
            .map_err(|_| SecretShareError::Unwrap)?;
        Ok(Secret::from(unwrapped))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_share_secret() {
        let secret = Secret::from_slice(&[42u8; SECRET_SIZE]).unwrap();
        let private_key = SecretKey::generate();
        let share = SecretShare::new(&secret, &private_key.public()).unwrap();
        assert_eq!(share.bytes().len(), SECRET_SHARE_SIZE);
        assert_eq!(secret, share.recover(&private_key).unwrap());
    }

    #[test]
    fn test_share_wrong_recipient() {
        let secret = Secret::generate();
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();

        let share = SecretShare::new(&secret, &alice.public()).unwrap();
        assert_eq!(secret, share.recover(&alice).unwrap());
        assert!(matches!(
            share.recover(&bob),
            Err(SecretShareError::Unwrap)
        ));
    }

    #[test]
    fn test_share_serde_formats() {
        let secret = Secret::generate();
        let private_key = SecretKey::generate();
        let share = SecretShare::new(&secret, &private_key.public()).unwrap();

        let json = serde_json::to_string(&share).unwrap();
        let json_share: SecretShare = serde_json::from_str(&json).unwrap();
        assert_eq!(share, json_share);

        let binary = bincode::serialize(&share).unwrap();
        let binary_share: SecretShare = bincode::deserialize(&binary).unwrap();
        assert_eq!(share, binary_share);
        assert_eq!(secret, binary_share.recover(&private_key).unwrap());
    }

    #[test]
    fn test_share_from_slice_length() {
        assert!(matches!(
            SecretShare::try_from(&[0u8; 10][..]),
            Err(SecretShareError::InvalidLength(10))
        ));
    }

    #[test]
    fn test_share_deserialize_invalid_length() {
        for len in [SECRET_SHARE_SIZE - 1, SECRET_SHARE_SIZE + 1] {
            let data = vec![0u8; len];
            let result: Result<SecretShare, _> =
                bincode::deserialize(&bincode::serialize(&data).unwrap());
            assert!(result.is_err());
        }
    }
}
