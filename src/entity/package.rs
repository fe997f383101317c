use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Problem;

/// One installable script in the repository index.
///
/// `name` is the unique key within an index; `source_url` points at the
/// payload the package manager downloads at install time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub description: String,
    pub version: String,
    pub category: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Order two version strings, semver when both sides parse, falling back to
/// plain string comparison otherwise.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

impl Package {
    /// Check this entry in isolation, appending every problem found.
    pub fn check(&self, problems: &mut Vec<Problem>) {
        if self.name.trim().is_empty() {
            problems.push(Problem::EmptyPackageName);
            return;
        }

        if self.description.trim().is_empty() {
            problems.push(Problem::EmptyDescription {
                package: self.name.clone(),
            });
        } else if self.description.contains('\n') {
            problems.push(Problem::MultilineDescription {
                package: self.name.clone(),
            });
        }

        match reqwest::Url::parse(&self.source_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    problems.push(Problem::NonHttpSourceUrl {
                        package: self.name.clone(),
                        url: self.source_url.clone(),
                    });
                }
            }
            Err(err) => {
                problems.push(Problem::InvalidSourceUrl {
                    package: self.name.clone(),
                    url: self.source_url.clone(),
                    reason: err.to_string(),
                });
            }
        }

        if semver::Version::parse(&self.version).is_err() {
            problems.push(Problem::LooseVersion {
                package: self.name.clone(),
                version: self.version.clone(),
            });
        }
    }
}
