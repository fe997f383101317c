mod index;
mod package;

pub use index::{Problem, RepoIndex, Upsert};
pub use package::{compare_versions, Package};
