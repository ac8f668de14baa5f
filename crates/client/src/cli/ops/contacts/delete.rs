use clap::Args;

use sealdrop_client::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Delete {
    /// Account name to forget
    pub name: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Delete {
    type Error = StateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let account = ctx.account()?;
        let mut book = account.load_addressbook()?;
        book.delete_entry(&self.name);
        account.save_addressbook(&book)?;
        Ok(format!("deleted {}", self.name))
    }
}
