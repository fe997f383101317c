use std::path::PathBuf;

use clap::Args;

use crate::{context::Context, entity::RepoIndex};

use super::Command;

#[derive(Args, Clone, Debug)]
pub struct RemoveArgs {
    /// The package to remove.
    name: String,
    /// The index file to edit.
    #[arg(long, default_value = "index.json")]
    file: PathBuf,
}

#[async_trait::async_trait]
impl Command for RemoveArgs {
    async fn run(&self, _context: &mut Context) -> anyhow::Result<()> {
        let mut index = RepoIndex::load(&self.file).await?;
        let removed = index
            .remove(&self.name)
            .ok_or_else(|| anyhow::anyhow!("package {} not found", self.name))?;
        index.save(&self.file).await?;
        println!("Removed {} {}", removed.name, removed.version);
        Ok(())
    }
}
