use clap::Args;

use sealdrop_client::transfer::TransferError;

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Push;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Push {
    type Error = PushError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (account, session) = ctx.session()?;
        session.push_config(&account.config).await?;
        Ok(format!(
            "backed up {} contacts for {}",
            session.book().entries.len(),
            account.config.name
        ))
    }
}
