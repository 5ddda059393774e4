use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::FolderPathProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Categories that always resolve, each to `<models_dir>/<category>` first.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "checkpoints",
    "clip",
    "clip_vision",
    "controlnet",
    "diffusion_models",
    "embeddings",
    "loras",
    "upscale_models",
    "vae",
];

/// On-disk extra search paths, e.g.
///
/// ```toml
/// [folders]
/// embeddings = ["/mnt/shared/embeddings"]
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FolderPathsFile {
    #[serde(default)]
    pub folders: BTreeMap<String, Vec<PathBuf>>,
}

impl FolderPathsFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let file: FolderPathsFile = toml::from_str(&content)?;
        Ok(file)
    }
}

/// Folder-path table built from [`Config`] and the optional extras file.
#[derive(Debug, Clone)]
pub struct ConfigFolderPaths {
    models_dir: PathBuf,
    extra: BTreeMap<String, Vec<PathBuf>>,
}

impl ConfigFolderPaths {
    pub fn new(models_dir: PathBuf, extra: BTreeMap<String, Vec<PathBuf>>) -> Self {
        Self { models_dir, extra }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let file = FolderPathsFile::load(&config.folder_paths_path)?;
        tracing::debug!(
            "Loaded {} extra folder categories from {:?}",
            file.folders.len(),
            config.folder_paths_path
        );
        Ok(Self::new(config.models_dir.clone(), file.folders))
    }
}

impl FolderPathProvider for ConfigFolderPaths {
    fn get_folder_paths(&self, category: &str) -> Result<Vec<PathBuf>> {
        let known = KNOWN_CATEGORIES.contains(&category);
        let extra = self.extra.get(category);

        if !known && extra.is_none() {
            return Err(Error::UnknownFolderCategory(category.to_string()));
        }

        let mut paths = Vec::new();
        if known {
            paths.push(self.models_dir.join(category));
        }
        for path in extra.into_iter().flatten() {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }

        tracing::debug!("Folder paths for '{}': {:?}", category, paths);
        Ok(paths)
    }
}
