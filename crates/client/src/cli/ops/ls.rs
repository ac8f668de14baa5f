use clap::Args;

use sealdrop_client::transfer::TransferError;

use crate::cli::op::SessionError;

/// List blobs waiting for the current account.
#[derive(Args, Debug, Clone)]
pub struct Ls;

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, session) = ctx.session()?;
        Ok(session.list_files().await?)
    }
}
