use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CHECKPOINT_FILE: &str = "model.safetensors";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub data_dir: PathBuf,
	pub models_dir: PathBuf,
	pub folder_paths_path: PathBuf,
	/// Overrides the hub client's cache location. `None` keeps the client default.
	pub hf_cache_dir: Option<PathBuf>,
	#[serde(skip_serializing)]
	pub hf_token: Option<String>,
	/// File fetched from each model repository.
	pub checkpoint_file: String,
}

impl Config {
	pub fn new() -> crate::error::Result<Self> {
		let project_dirs = ProjectDirs::from("", "", "hf-nodes")
			.ok_or_else(|| {
				crate::error::Error::Config("Could not determine config directory".to_string())
			})?;

		Self::with_data_dir(project_dirs.data_dir().to_path_buf())
	}

	pub fn with_data_dir(data_dir: PathBuf) -> crate::error::Result<Self> {
		let models_dir = data_dir.join("models");
		let folder_paths_path = data_dir.join("folder_paths.toml");

		std::fs::create_dir_all(&data_dir)?;
		std::fs::create_dir_all(&models_dir)?;

		Ok(Self {
			data_dir,
			models_dir,
			folder_paths_path,
			hf_cache_dir: None,
			hf_token: None,
			checkpoint_file: DEFAULT_CHECKPOINT_FILE.to_string(),
		})
	}

	pub fn from_env() -> crate::error::Result<Self> {
		let mut config = match std::env::var("HF_NODES_DATA_DIR") {
			Ok(data_dir) => Self::with_data_dir(PathBuf::from(data_dir))?,
			Err(_) => Self::new()?,
		};

		if let Ok(cache_dir) = std::env::var("HF_NODES_HF_CACHE") {
			config.hf_cache_dir = Some(PathBuf::from(cache_dir));
		}
		if let Ok(token) = std::env::var("HF_TOKEN") {
			if !token.trim().is_empty() {
				config.hf_token = Some(token);
			}
		}
		if let Ok(file) = std::env::var("HF_NODES_CHECKPOINT_FILE") {
			if file.trim().is_empty() {
				return Err(crate::error::Error::Config(
					"HF_NODES_CHECKPOINT_FILE is set but empty".to_string(),
				));
			}
			config.checkpoint_file = file;
		}

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn data_dir_layout_is_created() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("data");

		let config = Config::with_data_dir(root.clone()).unwrap();

		assert_eq!(config.models_dir, root.join("models"));
		assert_eq!(config.folder_paths_path, root.join("folder_paths.toml"));
		assert!(config.models_dir.is_dir());
		assert_eq!(config.checkpoint_file, DEFAULT_CHECKPOINT_FILE);
		assert!(config.hf_token.is_none());
	}

	#[test]
	fn token_is_not_serialized() {
		let dir = tempfile::tempdir().unwrap();
		let mut config = Config::with_data_dir(dir.path().to_path_buf()).unwrap();
		config.hf_token = Some("hf_secret".to_string());

		let json = serde_json::to_string(&config).unwrap();
		assert!(!json.contains("hf_secret"));
	}
}
