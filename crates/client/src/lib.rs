/**
 * Alias to account to public key cache,
 *  persisted per account.
 */
pub mod addressbook;
/**
 * HTTP client for the relay.
 *  - One request type per endpoint
 *  - The `Relay` trait sessions are written against
 */
pub mod api;
pub mod state;
/**
 * Upload and download orchestration:
 *  recipient resolution, sealing, opening, config backup.
 */
pub mod transfer;

pub mod prelude {
    pub use crate::addressbook::{AddressBook, AddressBookEntry};
    pub use crate::api::{ApiClient, ApiError, Relay};
    pub use crate::state::{AccountState, ClientConfig, ClientState, StateError};
    pub use crate::transfer::{Received, TransferClient, TransferError, UploadReceipt};
}
