/**
 * Content addresses for ciphertext held by the relay.
 */
pub mod blob_id;
/**
 * Cryptographic types and operations.
 *  - Public and Private key implementations
 *  - Per-recipient key wrapping
 *  - Signed multi-recipient envelopes
 */
pub mod crypto;
/**
 * Checksummed account names.
 */
pub mod identifier;
pub mod keyring;
/**
 * Header names, query parameters and payloads
 *  that both ends of the HTTP API agree on.
 */
pub mod protocol;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::blob_id::BlobIdScheme;
    pub use crate::crypto::{Envelope, EnvelopeError, Opened, PublicKey, SecretKey};
    pub use crate::keyring::{Keyring, MemoryKeyring};
    pub use crate::protocol::RegisterResponse;
    pub use crate::version::build_info;
}
