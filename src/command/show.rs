use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::{context::Context, entity::RepoIndex};

use super::Command;

#[derive(ValueEnum, Clone, Debug, Copy)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Clone, Debug)]
pub struct ShowArgs {
    /// The package to display.
    name: String,
    /// Read the index from a local file instead of the published one.
    #[arg(long)]
    file: Option<PathBuf>,
    /// The output format.
    #[arg(long, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[async_trait::async_trait]
impl Command for ShowArgs {
    async fn run(&self, context: &mut Context) -> anyhow::Result<()> {
        let index = match &self.file {
            Some(path) => RepoIndex::load(path).await?,
            None => {
                let (index, refreshed) = RepoIndex::try_to_fetch(context, false).await?;
                if refreshed {
                    context.caches.flush_meta().await?;
                }
                index
            }
        };

        let package = index
            .find(&self.name)
            .ok_or_else(|| anyhow::anyhow!("package {} not found", self.name))?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(package)?),
            OutputFormat::Text => {
                println!("Name:        {}", package.name);
                println!("Description: {}", package.description);
                println!("Version:     {}", package.version);
                println!("Category:    {}", package.category);
                println!("Source:      {}", package.source_url);
                if let Some(author) = &package.author {
                    println!("Author:      {}", author);
                }
                println!("License:     {} (repository-wide)", index.license);
            }
        }

        Ok(())
    }
}
