use std::path::PathBuf;

use clap::Args;

use crate::{
    context::Context,
    entity::{Package, Problem, RepoIndex, Upsert},
};

use super::Command;

#[derive(Args, Clone, Debug)]
pub struct AddArgs {
    /// The package name. Must be unique within the index.
    name: String,
    /// A one-line summary of what the script does.
    #[arg(long)]
    description: String,
    /// The package version.
    #[arg(long)]
    version: String,
    /// The category the package manager files the script under.
    #[arg(long, default_value = "Utilities")]
    category: String,
    /// Where the installable payload lives.
    #[arg(long)]
    source_url: String,
    /// The script author.
    #[arg(long)]
    author: Option<String>,
    /// The index file to edit.
    #[arg(long, default_value = "index.json")]
    file: PathBuf,
    /// Replace an existing entry even when its version is newer.
    #[arg(short, long, default_value = "false")]
    force: bool,
}

#[async_trait::async_trait]
impl Command for AddArgs {
    async fn run(&self, _context: &mut Context) -> anyhow::Result<()> {
        let package = Package {
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            category: self.category.clone(),
            source_url: self.source_url.clone(),
            author: self.author.clone(),
        };

        // Reject a broken entry before touching the file. A non-semver
        // version is only a warning: such entries are ordered by plain
        // string comparison, not refused.
        let mut problems = Vec::new();
        package.check(&mut problems);
        let (warnings, hard): (Vec<_>, Vec<_>) = problems
            .into_iter()
            .partition(|p| matches!(p, Problem::LooseVersion { .. }));
        if !hard.is_empty() {
            anyhow::bail!(
                "refusing to add an invalid entry: {}",
                hard.iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }
        for warning in &warnings {
            eprintln!("warning: {}", warning);
        }

        let mut index = RepoIndex::load(&self.file).await?;
        match index.upsert(package, self.force) {
            Upsert::Inserted => println!("Added {} {}", self.name, self.version),
            Upsert::Replaced { previous_version } => {
                println!("Updated {} {} -> {}", self.name, previous_version, self.version)
            }
            Upsert::Refused { existing_version } => anyhow::bail!(
                "{} {} is newer than {}, pass --force to downgrade",
                self.name,
                existing_version,
                self.version
            ),
        }
        index.save(&self.file).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::config::Config;

    use super::*;

    fn args(file: PathBuf, version: &str, source_url: &str) -> AddArgs {
        AddArgs {
            name: "RAPID".into(),
            description: "Track mapping, media import and LUFS normalization".into(),
            version: version.into(),
            category: "Utilities".into(),
            source_url: source_url.into(),
            author: None,
            file,
            force: false,
        }
    }

    async fn empty_index(path: &PathBuf) {
        RepoIndex::new("RAPID ReaScripts".into(), "MIT".into(), None)
            .save(path)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn loose_version_is_a_warning_not_a_refusal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        empty_index(&path).await;

        let mut context = Context::new(Config::default());
        args(path.clone(), "r2", "https://example.com/raw/main/rapid.lua")
            .run(&mut context)
            .await
            .unwrap();

        let index = RepoIndex::load(&path).await.unwrap();
        assert_eq!(index.find("RAPID").unwrap().version, "r2");
    }

    #[tokio::test]
    async fn invalid_source_url_is_still_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        empty_index(&path).await;

        let mut context = Context::new(Config::default());
        let result = args(path.clone(), "1.0.0", "scripts/rapid.lua")
            .run(&mut context)
            .await;

        assert!(result.is_err());
        let index = RepoIndex::load(&path).await.unwrap();
        assert_eq!(index.find("RAPID"), None);
    }
}
