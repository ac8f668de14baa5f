use std::path::PathBuf;

use clap::Args;

use sealdrop_client::transfer::TransferError;

use crate::cli::op::SessionError;

/// Download a blob, decrypt it and save it. The relay deletes it afterwards.
#[derive(Args, Debug, Clone)]
pub struct Receive {
    /// Blob id as shown by `sealdrop ls`
    pub blob_id: String,

    /// Directory to write into
    #[arg(long, short, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Receive {
    type Error = ReceiveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, session) = ctx.session()?;
        let saved = session.receive_into(&self.blob_id, &self.out).await?;

        let sender = &saved.received.sender;
        let from = match &saved.received.sender_alias {
            Some(alias) => format!("{} ({})", alias, sender),
            None => format!("{} (not in contacts)", sender),
        };
        Ok(format!("saved {} from {}", saved.path.display(), from))
    }
}
