use clap::Args;

use common::crypto::PublicKey;
use common::identifier;
use sealdrop_client::addressbook::AddressBookError;
use sealdrop_client::api::{ApiError, Relay};
use sealdrop_client::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Account name on the relay
    pub name: String,

    /// Local nickname (defaults to the name)
    #[arg(long, default_value = "")]
    pub alias: String,

    /// Hex public key, if known out of band
    #[arg(long)]
    pub key: Option<String>,

    /// Look the key up on the relay right away
    #[arg(long, conflicts_with = "key")]
    pub fetch: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error("{0} is not a valid account name")]
    InvalidName(String),
    #[error("invalid public key")]
    InvalidKey,
    #[error(transparent)]
    AddressBook(#[from] AddressBookError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("relay error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Add {
    type Error = AddError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        if !identifier::verify(&self.name) {
            return Err(AddError::InvalidName(self.name.clone()));
        }

        let account = ctx.account()?;
        let mut book = account.load_addressbook()?;
        book.add_entry(&self.name, &self.alias)?;

        let key = match (&self.key, self.fetch) {
            (Some(key), _) => Some(key.clone()),
            (None, true) => Some(ctx.client.lookup_key(&self.name).await?),
            (None, false) => None,
        };
        if let Some(key) = key {
            PublicKey::from_hex(&key).map_err(|_| AddError::InvalidKey)?;
            book.add_key(&self.name, &key)?;
        }

        account.save_addressbook(&book)?;
        Ok(format!("added {}", self.name))
    }
}
