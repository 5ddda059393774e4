use crate::error::{Error, Result};
use crate::model::{HubClient, HubError, ModelIdentifier};
use std::path::PathBuf;
use std::sync::Arc;

/// Makes sure a checkpoint from the hub is present locally.
pub struct ModelFetcher {
    client: Arc<dyn HubClient>,
    filename: String,
}

impl ModelFetcher {
    pub fn new(client: Arc<dyn HubClient>, filename: impl Into<String>) -> Self {
        Self {
            client,
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the local path of the checkpoint, downloading it if the
    /// client has no cached copy. A single attempt is made.
    pub fn fetch(&self, model_name: &str, revision: &str) -> Result<PathBuf> {
        let model = ModelIdentifier::with_revision(model_name, revision);

        tracing::info!("Fetching {} from {}", self.filename, model);

        match self.client.download(&model, &self.filename) {
            Ok(path) => {
                tracing::info!("Checkpoint available at {:?}", path);
                Ok(path)
            }
            Err(HubError::Http(source)) => {
                tracing::error!(
                    model = %model_name,
                    error = %source,
                    "Error downloading model {}. Response: {}",
                    model_name,
                    source
                );
                Err(Error::DownloadFailed {
                    model: model_name.to_string(),
                    source,
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}
