//! Single round-trip account registration.
//!
//! The requester presents a public key (and optionally a machine id); the
//! relay answers with credentials sealed to that key and signed with the
//! relay's identity, so only the key holder can read them and they can
//! check where they came from.

use common::crypto::{Envelope, EnvelopeError, PublicKey, SecretKey};
use common::protocol::{RegisterResponse, REGISTER_RESPONSE_FILENAME};

use crate::directory::{DirectoryError, UserDirectory};

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid public key: {0}")]
    InvalidKey(String),
    #[error("public key already registered")]
    AlreadyRegistered,
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("failed to seal response: {0}")]
    Seal(#[from] EnvelopeError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub public_key: String,
    pub machine_id: Option<String>,
}

/// Register the requester and return the sealed `RegisterResponse`.
pub fn register(
    directory: &UserDirectory,
    identity: &SecretKey,
    request: &RegisterRequest,
) -> Result<Vec<u8>, RegistrationError> {
    let public_key = PublicKey::from_hex(&request.public_key)
        .map_err(|e| RegistrationError::InvalidKey(e.to_string()))?;

    if directory.lookup_by_public_key(&public_key)?.is_some() {
        return Err(RegistrationError::AlreadyRegistered);
    }

    let (name, api_token) = match directory.register(&public_key) {
        Ok(creds) => creds,
        Err(DirectoryError::KeyTaken(_)) => return Err(RegistrationError::AlreadyRegistered),
        Err(e) => return Err(e.into()),
    };

    let machine_id = request
        .machine_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let machine_token = match machine_id {
        Some(id) => Some(directory.bind_machine(&name, id)?),
        None => None,
    };

    let response = RegisterResponse {
        name,
        api_token,
        machine_id: machine_id.map(str::to_string),
        machine_token,
    };
    let payload = serde_json::to_vec(&response)?;

    Ok(Envelope::seal(
        identity,
        &[public_key],
        REGISTER_RESPONSE_FILENAME,
        &payload,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn response_is_sealed_to_requester() {
        let dir = TempDir::new().unwrap();
        let directory = UserDirectory::open(dir.path().join("users.json"));
        let identity = SecretKey::generate();
        let requester = SecretKey::generate();

        let sealed = register(
            &directory,
            &identity,
            &RegisterRequest {
                public_key: requester.public().to_hex(),
                machine_id: Some("laptop".into()),
            },
        )
        .unwrap();

        assert!(Envelope::open(&SecretKey::generate(), &sealed).is_err());

        let opened = Envelope::open(&requester, &sealed).unwrap();
        assert_eq!(opened.sender, identity.public());
        let response: RegisterResponse = serde_json::from_slice(&opened.contents).unwrap();

        assert!(directory
            .authenticate(&response.name, &response.api_token)
            .unwrap());
        assert_eq!(response.machine_id.as_deref(), Some("laptop"));
        assert!(response.machine_token.is_some());
    }

    #[test]
    fn known_key_conflicts_and_keeps_token() {
        let dir = TempDir::new().unwrap();
        let directory = UserDirectory::open(dir.path().join("users.json"));
        let identity = SecretKey::generate();
        let requester = SecretKey::generate();
        let request = RegisterRequest {
            public_key: requester.public().to_hex(),
            machine_id: None,
        };

        let sealed = register(&directory, &identity, &request).unwrap();
        let opened = Envelope::open(&requester, &sealed).unwrap();
        let first: RegisterResponse = serde_json::from_slice(&opened.contents).unwrap();
        assert!(first.machine_token.is_none());

        assert!(matches!(
            register(&directory, &identity, &request),
            Err(RegistrationError::AlreadyRegistered)
        ));
        assert!(directory
            .authenticate(&first.name, &first.api_token)
            .unwrap());
    }

    #[test]
    fn garbage_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let directory = UserDirectory::open(dir.path().join("users.json"));
        let result = register(
            &directory,
            &SecretKey::generate(),
            &RegisterRequest {
                public_key: "zz".into(),
                machine_id: None,
            },
        );
        assert!(matches!(result, Err(RegistrationError::InvalidKey(_))));
    }
}
