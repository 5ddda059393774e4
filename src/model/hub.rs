use crate::config::Config;
use crate::error::{BoxError, Error, Result};
use crate::model::ModelIdentifier;
use hf_hub::api::sync::{Api, ApiBuilder, ApiError};
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum HubError {
    /// The request reached the network layer and failed there.
    #[error("hub request failed: {0}")]
    Http(#[source] BoxError),

    /// Cache, lock or header faults inside the client.
    #[error("hub client error: {0}")]
    Local(#[source] BoxError),
}

impl From<ApiError> for HubError {
    fn from(err: ApiError) -> Self {
        if matches!(err, ApiError::RequestError(_)) {
            HubError::Http(Box::new(err))
        } else {
            HubError::Local(Box::new(err))
        }
    }
}

/// Remote model hub. Implementations own their local cache.
#[cfg_attr(test, automock)]
pub trait HubClient: Send + Sync {
    fn download(
        &self,
        model: &ModelIdentifier,
        filename: &str,
    ) -> std::result::Result<PathBuf, HubError>;
}

pub struct HfHubClient {
    api: Api,
}

impl HfHubClient {
    /// Starts from the client's environment defaults (`HF_HOME`, `HF_ENDPOINT`
    /// and the cached `huggingface-cli login` token). An explicit token wins.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = ApiBuilder::from_env();
        if let Some(token) = &config.hf_token {
            builder = builder.with_token(Some(token.clone()));
        }
        if let Some(cache_dir) = &config.hf_cache_dir {
            builder = builder.with_cache_dir(cache_dir.clone());
        }

        let api = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to initialize HuggingFace client: {}", e)))?;

        Ok(Self { api })
    }
}

impl HubClient for HfHubClient {
    fn download(
        &self,
        model: &ModelIdentifier,
        filename: &str,
    ) -> std::result::Result<PathBuf, HubError> {
        let repo = self.api.repo(Repo::with_revision(
            model.repo_id.clone(),
            RepoType::Model,
            model.revision.clone(),
        ));

        Ok(repo.get(filename)?)
    }
}
