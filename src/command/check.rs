use std::path::PathBuf;

use clap::Args;
use stanza::{
    renderer::{console::Console, Renderer as _},
    style::{Header, Styles},
    table::{Row, Table},
};

use crate::{context::Context, entity::RepoIndex};

use super::Command;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Check a local index file instead of the published one.
    #[arg(long)]
    file: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Command for CheckArgs {
    async fn run(&self, context: &mut Context) -> anyhow::Result<()> {
        let index = match &self.file {
            Some(path) => RepoIndex::load(path).await?,
            None => {
                let url = context.config.index_url();
                reqwest::Url::parse(url)
                    .map_err(|e| anyhow::anyhow!("index url '{}' does not parse: {}", url, e))?;
                let (index, refreshed) = RepoIndex::try_to_fetch(context, false).await?;
                if refreshed {
                    context.caches.flush_meta().await?;
                }
                index
            }
        };

        let problems = index.validate();
        if problems.is_empty() {
            println!(
                "{}: {} package(s), no problems found",
                index.repository,
                index.packages.len()
            );
            return Ok(());
        }

        let mut table = Table::default().with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["#".into(), "Problem".into()],
        ));
        for (i, problem) in problems.iter().enumerate() {
            table.push_row(vec![format!("{}", i + 1), problem.to_string()]);
        }
        let renderer = Console::default();
        println!("{}", renderer.render(&table));

        anyhow::bail!("index has {} problem(s)", problems.len());
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::Config,
        entity::{Package, RepoIndex},
    };

    use super::*;

    #[tokio::test]
    async fn clean_index_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = RepoIndex::new("RAPID ReaScripts".into(), "MIT".into(), None);
        index.packages.push(Package {
            name: "RAPID".into(),
            description: "Track mapping, media import and LUFS normalization".into(),
            version: "1.2.0".into(),
            category: "Utilities".into(),
            source_url: "https://example.com/raw/main/rapid.lua".into(),
            author: None,
        });
        index.save(&path).await.unwrap();

        let mut context = Context::new(Config::default());
        let args = CheckArgs { file: Some(path) };
        assert!(args.run(&mut context).await.is_ok());
    }

    #[tokio::test]
    async fn broken_index_exits_non_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = RepoIndex::new("RAPID ReaScripts".into(), "MIT".into(), None);
        index.packages.push(Package {
            name: "RAPID".into(),
            description: "".into(),
            version: "1.2.0".into(),
            category: "Utilities".into(),
            source_url: "scripts/rapid.lua".into(),
            author: None,
        });
        index.save(&path).await.unwrap();

        let mut context = Context::new(Config::default());
        let args = CheckArgs { file: Some(path) };
        let err = args.run(&mut context).await.unwrap_err();
        assert!(err.to_string().contains("problem(s)"));
    }
}
