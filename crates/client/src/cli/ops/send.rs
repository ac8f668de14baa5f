use std::path::PathBuf;

use clap::Args;

use sealdrop_client::state::StateError;
use sealdrop_client::transfer::TransferError;

use crate::cli::op::SessionError;

/// Encrypt a file to one or more contacts and leave it on the relay.
#[derive(Args, Debug, Clone)]
pub struct SendFile {
    /// Comma separated aliases from the address book
    #[arg(long, short)]
    pub to: String,

    /// File to send
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("cannot read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SendFile {
    type Error = SendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SendError::Read(self.path.clone(), e))?;
        let filename = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let (account, mut session) = ctx.session()?;
        let result = session.upload_file(&self.to, &filename, &contents).await;
        // keys learned during resolution are kept even if the upload failed
        account.save_addressbook(session.book())?;
        let receipt = result?;

        let mut output = format!(
            "sent {} to {} as {}",
            filename,
            receipt.recipients.join(", "),
            receipt.blob_id
        );
        if !receipt.skipped.is_empty() {
            output.push_str(&format!("\nskipped: {}", receipt.skipped.join(", ")));
        }
        Ok(output)
    }
}
