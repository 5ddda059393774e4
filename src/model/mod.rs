pub mod fetcher;
pub mod hub;

pub use fetcher::ModelFetcher;
pub use hub::{HfHubClient, HubClient, HubError};

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_REVISION: &str = "main";

/// A repository on the hub pinned to a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentifier {
    pub repo_id: String,
    pub revision: String,
}

impl ModelIdentifier {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self::with_revision(repo_id, DEFAULT_REVISION)
    }

    pub fn with_revision(repo_id: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            revision: revision.into(),
        }
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repo_id, self.revision)
    }
}
