use crate::error::{Error, Result};
use crate::host::{CheckpointRuntime, LoadOptions};
use candle_core::{pickle, DType, Device, Tensor};
use candle_nn::VarBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    DiffusionModel,
    TextEncoder,
    Vae,
    /// Tensors no component claimed.
    Unclaimed,
}

impl ComponentKind {
    const CLAIMING: [ComponentKind; 3] = [
        ComponentKind::DiffusionModel,
        ComponentKind::TextEncoder,
        ComponentKind::Vae,
    ];

    fn prefixes(self) -> &'static [&'static str] {
        match self {
            ComponentKind::DiffusionModel => &["model.diffusion_model."],
            ComponentKind::TextEncoder => &[
                "cond_stage_model.",
                "conditioner.embedders.",
                "text_encoders.",
            ],
            ComponentKind::Vae => &["first_stage_model.", "vae."],
            ComponentKind::Unclaimed => &[],
        }
    }

    /// Finds the component a checkpoint key belongs to and the key with
    /// the component prefix removed.
    fn claim(name: &str) -> Option<(ComponentKind, &str)> {
        Self::CLAIMING.into_iter().find_map(|kind| {
            kind.prefixes()
                .iter()
                .find_map(|prefix| name.strip_prefix(*prefix))
                .map(|rest| (kind, rest))
        })
    }
}

/// Weights of one checkpoint component, keyed without the component prefix.
#[derive(Debug, Clone)]
pub struct ComponentWeights {
    kind: ComponentKind,
    tensors: HashMap<String, Tensor>,
    device: Device,
    embedding_directories: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentSummary {
    pub kind: ComponentKind,
    pub tensors: usize,
    pub parameters: usize,
}

impl ComponentWeights {
    pub fn new(kind: ComponentKind, tensors: HashMap<String, Tensor>, device: Device) -> Self {
        Self {
            kind,
            tensors,
            device,
            embedding_directories: Vec::new(),
        }
    }

    pub fn empty(kind: ComponentKind, device: Device) -> Self {
        Self::new(kind, HashMap::new(), device)
    }

    pub fn with_embedding_directories(mut self, directories: Vec<PathBuf>) -> Self {
        self.embedding_directories = directories;
        self
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn tensors(&self) -> &HashMap<String, Tensor> {
        &self.tensors
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn parameter_count(&self) -> usize {
        self.tensors.values().map(|t| t.elem_count()).sum()
    }

    pub fn embedding_directories(&self) -> &[PathBuf] {
        &self.embedding_directories
    }

    pub fn var_builder(&self, dtype: DType) -> VarBuilder<'static> {
        VarBuilder::from_tensors(self.tensors.clone(), dtype, &self.device)
    }

    pub fn summary(&self) -> ComponentSummary {
        ComponentSummary {
            kind: self.kind,
            tensors: self.tensors.len(),
            parameters: self.parameter_count(),
        }
    }
}

/// Loads single-file diffusion checkpoints with candle.
pub struct CandleCheckpointRuntime {
    device: Device,
}

impl CandleCheckpointRuntime {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    fn read_tensors(&self, path: &Path) -> Result<HashMap<String, Tensor>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("safetensors") => {
                candle_core::safetensors::load(path, &self.device).map_err(|e| {
                    Error::CheckpointLoad(format!("Failed to read SafeTensors {:?}: {}", path, e))
                })
            }
            Some("ckpt") | Some("pt") | Some("pth") | Some("bin") => {
                let mut tensors_vec = pickle::read_all(path).map_err(|e| {
                    Error::CheckpointLoad(format!("Failed to read PyTorch file {:?}: {}", path, e))
                })?;

                // Lightning checkpoints nest the weights under "state_dict".
                if tensors_vec.is_empty() {
                    tensors_vec = pickle::read_all_with_key(path, Some("state_dict")).map_err(|e| {
                        Error::CheckpointLoad(format!(
                            "Failed to read PyTorch state_dict {:?}: {}",
                            path, e
                        ))
                    })?;
                }

                tracing::debug!("Read {} tensors from PyTorch checkpoint", tensors_vec.len());

                tensors_vec
                    .into_iter()
                    .map(|(name, tensor)| tensor.to_device(&self.device).map(|t| (name, t)))
                    .collect::<candle_core::Result<HashMap<_, _>>>()
                    .map_err(|e| {
                        Error::CheckpointLoad(format!("Failed to move tensors to device: {}", e))
                    })
            }
            _ => Err(Error::CheckpointLoad(format!(
                "Unsupported checkpoint format: {:?}",
                path
            ))),
        }
    }
}

impl CheckpointRuntime for CandleCheckpointRuntime {
    type Handle = ComponentWeights;

    fn load_checkpoint_guess_config(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Vec<ComponentWeights>> {
        tracing::info!("Loading checkpoint from: {:?}", path);

        let tensors = self.read_tensors(path)?;
        let total = tensors.len();

        let mut buckets: HashMap<ComponentKind, HashMap<String, Tensor>> = HashMap::new();
        for (name, tensor) in tensors {
            let (kind, key) = match ComponentKind::claim(&name) {
                Some((kind, rest)) => (kind, rest.to_string()),
                None => (ComponentKind::Unclaimed, name),
            };
            buckets.entry(kind).or_default().insert(key, tensor);
        }
        let mut take = |kind: ComponentKind| buckets.remove(&kind).unwrap_or_default();

        let model = ComponentWeights::new(
            ComponentKind::DiffusionModel,
            take(ComponentKind::DiffusionModel),
            self.device.clone(),
        );
        if model.is_empty() {
            return Err(Error::CheckpointLoad(format!(
                "No diffusion model weights found in {:?}",
                path
            )));
        }

        let clip = if options.output_clip {
            ComponentWeights::new(
                ComponentKind::TextEncoder,
                take(ComponentKind::TextEncoder),
                self.device.clone(),
            )
            .with_embedding_directories(options.embedding_directory.clone())
        } else {
            ComponentWeights::empty(ComponentKind::TextEncoder, self.device.clone())
        };
        if options.output_clip && clip.is_empty() {
            tracing::warn!("No text encoder weights found in checkpoint");
        }

        let vae = if options.output_vae {
            ComponentWeights::new(ComponentKind::Vae, take(ComponentKind::Vae), self.device.clone())
        } else {
            ComponentWeights::empty(ComponentKind::Vae, self.device.clone())
        };
        if options.output_vae && vae.is_empty() {
            tracing::warn!("No VAE weights found in checkpoint");
        }

        let unclaimed = ComponentWeights::new(
            ComponentKind::Unclaimed,
            take(ComponentKind::Unclaimed),
            self.device.clone(),
        );

        tracing::info!("Checkpoint loaded successfully");
        tracing::info!("  Tensors: {}", total);
        tracing::info!("  Diffusion model: {}", model.tensors.len());
        tracing::info!("  Text encoder: {}", clip.tensors.len());
        tracing::info!("  VAE: {}", vae.tensors.len());
        tracing::info!("  Unclaimed: {}", unclaimed.tensors.len());

        Ok(vec![model, clip, vae, unclaimed])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_checkpoint(dir: &Path, names: &[&str]) -> PathBuf {
        let tensors: HashMap<String, Tensor> = names
            .iter()
            .map(|name| {
                let tensor = Tensor::zeros((2, 3), DType::F32, &Device::Cpu).unwrap();
                (name.to_string(), tensor)
            })
            .collect();
        let path = dir.join("ckpt.safetensors");
        candle_core::safetensors::save(&tensors, &path).unwrap();
        path
    }

    #[test]
    fn claim_strips_component_prefix() {
        assert_eq!(
            ComponentKind::claim("model.diffusion_model.out.2.weight"),
            Some((ComponentKind::DiffusionModel, "out.2.weight"))
        );
        assert_eq!(
            ComponentKind::claim("conditioner.embedders.0.transformer.x"),
            Some((ComponentKind::TextEncoder, "0.transformer.x"))
        );
        assert_eq!(
            ComponentKind::claim("first_stage_model.decoder.conv_in.bias"),
            Some((ComponentKind::Vae, "decoder.conv_in.bias"))
        );
        assert_eq!(ComponentKind::claim("model_ema.decay"), None);
    }

    #[test]
    fn splits_checkpoint_into_components() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(
            dir.path(),
            &[
                "model.diffusion_model.input_blocks.0.weight",
                "cond_stage_model.transformer.embeddings.weight",
                "first_stage_model.decoder.conv_in.weight",
                "model_ema.decay",
            ],
        );
        let options = LoadOptions {
            embedding_directory: vec![PathBuf::from("/emb")],
            ..LoadOptions::default()
        };

        let out = CandleCheckpointRuntime::new(Device::Cpu)
            .load_checkpoint_guess_config(&path, &options)
            .unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(out[0].kind(), ComponentKind::DiffusionModel);
        assert!(out[0].tensors().contains_key("input_blocks.0.weight"));
        assert_eq!(out[0].parameter_count(), 6);
        assert_eq!(out[1].kind(), ComponentKind::TextEncoder);
        assert_eq!(out[1].embedding_directories(), &[PathBuf::from("/emb")]);
        assert_eq!(out[2].kind(), ComponentKind::Vae);
        assert_eq!(out[2].summary().tensors, 1);
        assert_eq!(out[3].kind(), ComponentKind::Unclaimed);
        assert!(out[3].tensors().contains_key("model_ema.decay"));
    }

    #[test]
    fn disabled_outputs_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(
            dir.path(),
            &[
                "model.diffusion_model.out.weight",
                "cond_stage_model.proj",
                "first_stage_model.quant_conv.weight",
            ],
        );
        let options = LoadOptions {
            output_vae: false,
            output_clip: false,
            embedding_directory: Vec::new(),
        };

        let out = CandleCheckpointRuntime::new(Device::Cpu)
            .load_checkpoint_guess_config(&path, &options)
            .unwrap();

        assert!(out[1].is_empty());
        assert!(out[2].is_empty());
    }

    #[test]
    fn checkpoint_without_diffusion_weights_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(dir.path(), &["first_stage_model.decoder.conv_in.weight"]);

        let err = CandleCheckpointRuntime::new(Device::Cpu)
            .load_checkpoint_guess_config(&path, &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::CheckpointLoad(_)));
    }

    #[test]
    fn missing_and_unsupported_files_fail() {
        let runtime = CandleCheckpointRuntime::new(Device::Cpu);
        let dir = tempfile::tempdir().unwrap();

        let options = LoadOptions::default();

        assert!(matches!(
            runtime.load_checkpoint_guess_config(&dir.path().join("absent.safetensors"), &options),
            Err(Error::CheckpointLoad(_))
        ));
        assert!(matches!(
            runtime.load_checkpoint_guess_config(&dir.path().join("model.gguf"), &options),
            Err(Error::CheckpointLoad(_))
        ));
    }

    #[test]
    fn var_builder_reads_stripped_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(dir.path(), &["model.diffusion_model.time_embed.0.weight"]);

        let out = CandleCheckpointRuntime::new(Device::Cpu)
            .load_checkpoint_guess_config(&path, &LoadOptions::default())
            .unwrap();

        let vb = out[0].var_builder(DType::F32).pp("time_embed").pp("0");
        let weight = vb.get((2, 3), "weight").unwrap();
        assert_eq!(weight.dims(), &[2, 3]);
    }
}
