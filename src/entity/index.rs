use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::context::Context;

use super::{compare_versions, Package};

/// Cache file name for the fetched copy of the published index.
const INDEX_CACHE_FILE: &str = "index.json";

/// License identifiers the `check` command accepts. The seed repository
/// ships everything under MIT.
const KNOWN_LICENSES: &[&str] = &[
    "MIT",
    "Apache-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "GPL-2.0-only",
    "GPL-3.0-only",
    "LGPL-3.0-only",
    "MPL-2.0",
    "ISC",
    "Unlicense",
    "CC0-1.0",
];

/// The published repository index: one document listing every installable
/// script, consumed read-only by the package-manager extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoIndex {
    pub repository: String,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default)]
    pub packages: Vec<Package>,
}

/// Everything `RepoIndex::validate` can complain about.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Problem {
    #[error("repository name is empty")]
    EmptyRepositoryName,
    #[error("license '{0}' is not a recognized SPDX identifier")]
    UnknownLicense(String),
    #[error("duplicate package name '{0}'")]
    DuplicateName(String),
    #[error("package has an empty name")]
    EmptyPackageName,
    #[error("package '{package}' has an empty description")]
    EmptyDescription { package: String },
    #[error("package '{package}' has a description spanning multiple lines")]
    MultilineDescription { package: String },
    #[error("package '{package}' source url '{url}' does not parse: {reason}")]
    InvalidSourceUrl {
        package: String,
        url: String,
        reason: String,
    },
    #[error("package '{package}' source url '{url}' is not http(s)")]
    NonHttpSourceUrl { package: String, url: String },
    #[error("package '{package}' version '{version}' is not semver")]
    LooseVersion { package: String, version: String },
}

/// What `upsert` did with the offered entry.
#[derive(Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    /// An entry of the same name existed and was replaced.
    Replaced { previous_version: String },
    /// The existing entry carries a newer version; nothing changed.
    Refused { existing_version: String },
}

impl RepoIndex {
    pub fn new(repository: String, license: String, homepage: Option<String>) -> Self {
        Self {
            repository,
            license,
            homepage,
            packages: Vec::new(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|pkg| pkg.name == name)
    }

    /// Insert the entry, or replace the existing entry of the same name.
    ///
    /// Without `force`, an existing entry is only replaced when the offered
    /// version is not older than the one in the index.
    pub fn upsert(&mut self, package: Package, force: bool) -> Upsert {
        match self.packages.iter_mut().find(|p| p.name == package.name) {
            Some(existing) => {
                let newer = compare_versions(&package.version, &existing.version).is_ge();
                if force || newer {
                    let previous_version = std::mem::replace(existing, package).version;
                    Upsert::Replaced { previous_version }
                } else {
                    Upsert::Refused {
                        existing_version: existing.version.clone(),
                    }
                }
            }
            None => {
                self.packages.push(package);
                Upsert::Inserted
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Package> {
        let pos = self.packages.iter().position(|pkg| pkg.name == name)?;
        Some(self.packages.remove(pos))
    }

    /// Union another index into this one. On a name collision the entry
    /// with the newer version wins.
    pub fn merge(&mut self, other: RepoIndex) {
        for package in other.packages {
            self.upsert(package, false);
        }
    }

    /// Run every invariant check and return all problems found. An empty
    /// result means the index is publishable.
    pub fn validate(&self) -> Vec<Problem> {
        let mut problems = Vec::new();

        if self.repository.trim().is_empty() {
            problems.push(Problem::EmptyRepositoryName);
        }
        if !KNOWN_LICENSES.contains(&self.license.as_str()) {
            problems.push(Problem::UnknownLicense(self.license.clone()));
        }

        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for package in &self.packages {
            if !seen.insert(package.name.as_str()) && reported.insert(package.name.as_str()) {
                problems.push(Problem::DuplicateName(package.name.clone()));
            }
            package.check(&mut problems);
        }

        problems
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("Read {}, err: {}", path.display(), e))?;
        let index = serde_json::from_slice(&content)
            .map_err(|e| anyhow::anyhow!("Parse {}, err: {}", path.display(), e))?;
        Ok(index)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        tokio::fs::write(path.as_ref(), content).await?;
        Ok(())
    }

    /// Fetch the published index if the cached copy is stale or missing,
    /// otherwise return the cached copy. The boolean reports whether a
    /// network fetch happened.
    pub async fn try_to_fetch(context: &Context, force: bool) -> anyhow::Result<(Self, bool)> {
        if !force
            && context.cache_file_exists(INDEX_CACHE_FILE)
            && !context.caches.should_refresh()
        {
            let index = context.read_from_cache(INDEX_CACHE_FILE).await?;
            return Ok((index, false));
        }

        let pb = context.bar.add_root();
        let index = context
            .download_file(INDEX_CACHE_FILE, context.config.index_url(), &pb, false)
            .await?;
        pb.finish("Index fetched");
        Ok((index, true))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn package(name: &str, version: &str) -> Package {
        Package {
            name: name.into(),
            description: format!("{name} does one thing well"),
            version: version.into(),
            category: "Utilities".into(),
            source_url: format!("https://example.com/raw/main/{name}.lua"),
            author: None,
        }
    }

    fn index() -> RepoIndex {
        let mut index = RepoIndex::new("RAPID ReaScripts".into(), "MIT".into(), None);
        index.packages.push(package("RAPID", "1.2.0"));
        index
    }

    #[test]
    fn clean_index_validates() {
        assert_eq!(index().validate(), vec![]);
    }

    #[test]
    fn empty_index_is_valid() {
        let index = RepoIndex::new("RAPID ReaScripts".into(), "MIT".into(), None);
        assert_eq!(index.validate(), vec![]);
    }

    #[test]
    fn unknown_license_is_reported() {
        let mut index = index();
        index.license = "MIT-ish".into();
        assert_eq!(
            index.validate(),
            vec![Problem::UnknownLicense("MIT-ish".into())]
        );
    }

    #[test]
    fn duplicate_names_reported_once_per_name() {
        let mut index = index();
        index.packages.push(package("RAPID", "1.3.0"));
        index.packages.push(package("RAPID", "1.4.0"));
        let duplicates = index
            .validate()
            .into_iter()
            .filter(|p| matches!(p, Problem::DuplicateName(_)))
            .count();
        assert_eq!(duplicates, 1);
    }

    #[test]
    fn upsert_inserts_new_entries() {
        let mut index = index();
        let outcome = index.upsert(package("Loudness Report", "0.1.0"), false);
        assert_eq!(outcome, Upsert::Inserted);
        assert_eq!(index.packages.len(), 2);
    }

    #[test]
    fn upsert_refuses_downgrades() {
        let mut index = index();
        let outcome = index.upsert(package("RAPID", "1.1.0"), false);
        assert_eq!(
            outcome,
            Upsert::Refused {
                existing_version: "1.2.0".into()
            }
        );
        assert_eq!(index.find("RAPID").unwrap().version, "1.2.0");
    }

    #[test]
    fn forced_upsert_downgrades() {
        let mut index = index();
        let outcome = index.upsert(package("RAPID", "1.1.0"), true);
        assert_eq!(
            outcome,
            Upsert::Replaced {
                previous_version: "1.2.0".into()
            }
        );
        assert_eq!(index.find("RAPID").unwrap().version, "1.1.0");
    }

    #[test]
    fn merge_keeps_the_newer_version() {
        let mut ours = index();
        let mut theirs = RepoIndex::new("RAPID ReaScripts".into(), "MIT".into(), None);
        theirs.packages.push(package("RAPID", "1.3.0"));
        theirs.packages.push(package("Loudness Report", "0.1.0"));

        ours.merge(theirs);

        assert_eq!(ours.packages.len(), 2);
        assert_eq!(ours.find("RAPID").unwrap().version, "1.3.0");
        assert_eq!(ours.validate(), vec![]);
    }

    #[test]
    fn remove_returns_the_entry() {
        let mut index = index();
        let removed = index.remove("RAPID");
        assert_eq!(removed.map(|p| p.version), Some("1.2.0".into()));
        assert_eq!(index.remove("RAPID"), None);
    }

    #[test]
    fn index_round_trips_through_json() {
        let index = index();
        let json = serde_json::to_string(&index).unwrap();
        let back: RepoIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[tokio::test]
    async fn index_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = index();
        index.save(&path).await.unwrap();
        let back = RepoIndex::load(&path).await.unwrap();

        assert_eq!(back, index);
    }
}
