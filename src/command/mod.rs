use crate::context::Context;

mod add;
mod check;
mod init;
mod remove;
mod search;
mod show;
mod update;

pub use add::AddArgs;
pub use check::CheckArgs;
pub use init::InitArgs;
pub use remove::RemoveArgs;
pub use search::SearchArgs;
pub use show::ShowArgs;
pub use update::UpdateArgs;

#[async_trait::async_trait]
pub trait Command {
    /// Run the command.
    async fn run(&self, context: &mut Context) -> anyhow::Result<()>;
}
