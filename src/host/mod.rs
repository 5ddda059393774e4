//! Seams to the host runtime.
//!
//! The node never talks to the host directly. It goes through a
//! [`PathResolver`] and a [`CheckpointLoader`], each of which forwards to an
//! injected implementation, so the node can run against the bundled
//! defaults ([`ConfigFolderPaths`], [`CandleCheckpointRuntime`]) or a
//! substitute in tests.

pub mod folder_paths;
pub mod runtime;

pub use folder_paths::ConfigFolderPaths;
pub use runtime::{CandleCheckpointRuntime, ComponentKind, ComponentSummary, ComponentWeights};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Resolves a named folder category to its search paths.
#[cfg_attr(test, automock)]
pub trait FolderPathProvider: Send + Sync {
    fn get_folder_paths(&self, category: &str) -> Result<Vec<PathBuf>>;
}

/// Parses a checkpoint file into model handles, in the order
/// denoiser, text encoder, image encoder, followed by anything extra.
#[cfg_attr(test, automock(type Handle = String;))]
pub trait CheckpointRuntime: Send + Sync {
    type Handle;

    fn load_checkpoint_guess_config(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Vec<Self::Handle>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub output_vae: bool,
    pub output_clip: bool,
    pub embedding_directory: Vec<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            output_vae: true,
            output_clip: true,
            embedding_directory: Vec::new(),
        }
    }
}

pub struct PathResolver {
    provider: Arc<dyn FolderPathProvider>,
}

impl PathResolver {
    pub fn new(provider: Arc<dyn FolderPathProvider>) -> Self {
        Self { provider }
    }

    pub fn get_paths(&self, category: &str) -> Result<Vec<PathBuf>> {
        self.provider.get_folder_paths(category)
    }
}

pub struct CheckpointLoader<H> {
    runtime: Arc<dyn CheckpointRuntime<Handle = H>>,
}

impl<H> CheckpointLoader<H> {
    pub fn new(runtime: Arc<dyn CheckpointRuntime<Handle = H>>) -> Self {
        Self { runtime }
    }

    pub fn load(&self, path: &Path, options: &LoadOptions) -> Result<Vec<H>> {
        self.runtime.load_checkpoint_guess_config(path, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn path_resolver_forwards_category_and_errors() {
        let mut provider = MockFolderPathProvider::new();
        provider
            .expect_get_folder_paths()
            .withf(|category| category == "embeddings")
            .times(1)
            .returning(|_| Ok(vec![PathBuf::from("/emb")]));
        provider
            .expect_get_folder_paths()
            .withf(|category| category == "nope")
            .times(1)
            .returning(|c| Err(Error::UnknownFolderCategory(c.to_string())));

        let resolver = PathResolver::new(Arc::new(provider));

        assert_eq!(resolver.get_paths("embeddings").unwrap(), vec![PathBuf::from("/emb")]);
        assert!(matches!(
            resolver.get_paths("nope"),
            Err(Error::UnknownFolderCategory(c)) if c == "nope"
        ));
    }

    #[test]
    fn checkpoint_loader_forwards_path_and_options() {
        let options = LoadOptions {
            embedding_directory: vec![PathBuf::from("/emb")],
            ..LoadOptions::default()
        };
        let expected = options.clone();

        let mut runtime = MockCheckpointRuntime::new();
        runtime
            .expect_load_checkpoint_guess_config()
            .withf(move |path, opts| path == Path::new("/ckpt.safetensors") && *opts == expected)
            .times(1)
            .returning(|_, _| Ok(vec!["M".to_string(), "C".to_string(), "V".to_string()]));

        let loader = CheckpointLoader::new(Arc::new(runtime));
        let out = loader.load(Path::new("/ckpt.safetensors"), &options).unwrap();
        assert_eq!(out, vec!["M", "C", "V"]);
    }
}
