use crate::error::{Error, Result};
use crate::host::{CheckpointLoader, LoadOptions, PathResolver};
use crate::model::{ModelFetcher, DEFAULT_REVISION};
use crate::nodes::{InputSpec, InputTypes, NodeInfo};
use serde::{Deserialize, Serialize};

pub const NODE_KEY: &str = "HfCheckpointLoader";
pub const DISPLAY_NAME: &str = "HuggingFace Checkpoint Loader";
pub const CATEGORY: &str = "loaders";
pub const DESCRIPTION: &str = "Loads a diffusion model checkpoint from HuggingFace, \
    diffusion models are used to denoise latents.";
pub const FUNCTION: &str = "load_checkpoint";
pub const RETURN_TYPES: [&str; 3] = ["MODEL", "CLIP", "VAE"];
pub const OUTPUT_TOOLTIPS: [&str; 3] = [
    "The model used for denoising latents.",
    "The CLIP model used for encoding text prompts.",
    "The VAE model used for encoding and decoding images to and from latent space.",
];

const EMBEDDINGS_CATEGORY: &str = "embeddings";

pub fn node_info() -> NodeInfo {
    NodeInfo {
        name: NODE_KEY,
        display_name: DISPLAY_NAME,
        category: CATEGORY,
        description: DESCRIPTION,
        function: FUNCTION,
        input: InputTypes {
            required: vec![
                ("model_name", InputSpec::string()),
                ("revision", InputSpec::string().with_default(DEFAULT_REVISION)),
            ],
        },
        output: RETURN_TYPES.to_vec(),
        output_tooltips: OUTPUT_TOOLTIPS.to_vec(),
    }
}

fn default_revision() -> String {
    DEFAULT_REVISION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointLoaderInputs {
    pub model_name: String,
    #[serde(default = "default_revision")]
    pub revision: String,
}

impl CheckpointLoaderInputs {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            revision: default_revision(),
        }
    }
}

/// The three outputs of the node, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCheckpoint<H> {
    pub model: H,
    pub clip: H,
    pub vae: H,
}

/// Downloads a checkpoint from the hub and loads it through the host.
pub struct HfCheckpointLoader<H> {
    path_resolver: PathResolver,
    checkpoint_loader: CheckpointLoader<H>,
    model_downloader: ModelFetcher,
}

impl<H> HfCheckpointLoader<H> {
    pub fn new(
        model_downloader: ModelFetcher,
        path_resolver: PathResolver,
        checkpoint_loader: CheckpointLoader<H>,
    ) -> Self {
        Self {
            path_resolver,
            checkpoint_loader,
            model_downloader,
        }
    }

    /// Validates node inputs and runs [`Self::load_checkpoint`].
    ///
    /// `revision` is part of the declared inputs but is not used: the
    /// checkpoint is always fetched from the default branch.
    // FIXME: thread `inputs.revision` through once callers stop relying on "main".
    pub fn execute(&self, inputs: &CheckpointLoaderInputs) -> Result<LoadedCheckpoint<H>> {
        if inputs.model_name.trim().is_empty() {
            return Err(Error::InvalidInput("model_name must not be empty".to_string()));
        }
        if inputs.revision != DEFAULT_REVISION {
            tracing::warn!(
                "Ignoring revision '{}' for {}; loading '{}'",
                inputs.revision,
                inputs.model_name,
                DEFAULT_REVISION
            );
        }

        self.load_checkpoint(&inputs.model_name)
    }

    pub fn load_checkpoint(&self, model_name: &str) -> Result<LoadedCheckpoint<H>> {
        let ckpt_path = self.model_downloader.fetch(model_name, DEFAULT_REVISION)?;

        let options = LoadOptions {
            output_vae: true,
            output_clip: true,
            embedding_directory: self.path_resolver.get_paths(EMBEDDINGS_CATEGORY)?,
        };
        let out = self.checkpoint_loader.load(&ckpt_path, &options)?;

        let count = out.len();
        let mut out = out.into_iter();
        match (out.next(), out.next(), out.next()) {
            (Some(model), Some(clip), Some(vae)) => Ok(LoadedCheckpoint { model, clip, vae }),
            _ => Err(Error::IncompleteCheckpoint(count)),
        }
    }
}
