use std::path::PathBuf;

use clap::Args;

use crate::{context::Context, entity::RepoIndex};

use super::Command;

#[derive(Args, Clone, Debug)]
pub struct InitArgs {
    /// The repository display name.
    repository: String,
    /// The SPDX license identifier covering every script in the repository.
    #[arg(long, default_value = "MIT")]
    license: String,
    /// The project homepage.
    #[arg(long)]
    homepage: Option<String>,
    /// Where to write the index file.
    #[arg(long, default_value = "index.json")]
    file: PathBuf,
    /// Overwrite an existing index file.
    #[arg(long, default_value = "false")]
    overwrite: bool,
}

#[async_trait::async_trait]
impl Command for InitArgs {
    async fn run(&self, _context: &mut Context) -> anyhow::Result<()> {
        if self.file.exists() && !self.overwrite {
            anyhow::bail!(
                "{} already exists, pass --overwrite to replace it",
                self.file.display()
            );
        }

        let index = RepoIndex::new(
            self.repository.clone(),
            self.license.clone(),
            self.homepage.clone(),
        );

        let problems = index.validate();
        if !problems.is_empty() {
            anyhow::bail!(
                "refusing to create an invalid index: {}",
                problems
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }

        index.save(&self.file).await?;
        println!("Created {} for '{}'", self.file.display(), index.repository);
        Ok(())
    }
}
