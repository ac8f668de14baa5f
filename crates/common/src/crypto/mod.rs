//! Cryptographic primitives for sealdrop
//!
//! - **Identity**: Ed25519 keypairs (`SecretKey`/`PublicKey`). An account is
//!   its public key plus the name the relay allocated for it.
//! - **Content encryption**: ChaCha20-Poly1305 under a fresh `Secret` per file.
//! - **Key sharing**: the file secret is wrapped once per recipient with
//!   ephemeral X25519 ECDH + AES-KW (`SecretShare`).
//! - **Envelope**: shares, sender key, encrypted payload and an Ed25519
//!   signature over all of it. This is the only thing the relay stores.

mod envelope;
mod keys;
mod secret;
mod secret_share;

pub use ed25519_dalek::Signature;
pub use envelope::{Envelope, EnvelopeError, Opened, ENVELOPE_VERSION};
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use secret::{Secret, SecretError, BLAKE3_HASH_SIZE};
pub use secret_share::{SecretShare, SecretShareError};
