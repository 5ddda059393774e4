//! Node declarations and the static tables the host discovers them through.

pub mod checkpoint;

pub use checkpoint::{CheckpointLoaderInputs, HfCheckpointLoader, LoadedCheckpoint};

use crate::config::Config;
use crate::error::Result;
use crate::host::{
    CandleCheckpointRuntime, CheckpointLoader, ComponentWeights, ConfigFolderPaths, PathResolver,
};
use crate::model::{HfHubClient, ModelFetcher};
use candle_core::Device;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// One declared input, rendered as `["STRING"]` or `["STRING", {"default": ...}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub kind: &'static str,
    pub default: Option<&'static str>,
}

impl InputSpec {
    pub fn string() -> Self {
        Self {
            kind: "STRING",
            default: None,
        }
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

impl Serialize for InputSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = if self.default.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(self.kind)?;
        if let Some(default) = self.default {
            seq.serialize_element(&serde_json::json!({ "default": default }))?;
        }
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputTypes {
    #[serde(serialize_with = "ordered_map")]
    pub required: Vec<(&'static str, InputSpec)>,
}

fn ordered_map<S: Serializer>(
    entries: &[(&'static str, InputSpec)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (name, spec) in entries {
        map.serialize_entry(name, spec)?;
    }
    map.end()
}

/// Static description of a node, as shown by the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub function: &'static str,
    pub input: InputTypes,
    pub output: Vec<&'static str>,
    pub output_tooltips: Vec<&'static str>,
}

pub struct NodeClass {
    pub info: fn() -> NodeInfo,
}

// Keys must be globally unique across every plugin the host loads.
pub static NODE_CLASS_MAPPINGS: &[(&str, NodeClass)] = &[(
    checkpoint::NODE_KEY,
    NodeClass {
        info: checkpoint::node_info,
    },
)];

pub static NODE_DISPLAY_NAME_MAPPINGS: &[(&str, &str)] =
    &[(checkpoint::NODE_KEY, checkpoint::DISPLAY_NAME)];

pub fn node_class(key: &str) -> Option<&'static NodeClass> {
    NODE_CLASS_MAPPINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, class)| class)
}

pub fn display_name(key: &str) -> Option<&'static str> {
    NODE_DISPLAY_NAME_MAPPINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

pub fn all_node_info() -> Vec<NodeInfo> {
    NODE_CLASS_MAPPINGS.iter().map(|(_, class)| (class.info)()).collect()
}

/// Wires the checkpoint loader to the bundled hub client and host defaults.
pub fn default_checkpoint_loader(
    config: &Config,
    device: Device,
) -> Result<HfCheckpointLoader<ComponentWeights>> {
    let hub = HfHubClient::new(config)?;
    let folders = ConfigFolderPaths::from_config(config)?;

    Ok(HfCheckpointLoader::new(
        ModelFetcher::new(Arc::new(hub), config.checkpoint_file.clone()),
        PathResolver::new(Arc::new(folders)),
        CheckpointLoader::new(Arc::new(CandleCheckpointRuntime::new(device))),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_class_has_a_display_name() {
        for (key, class) in NODE_CLASS_MAPPINGS {
            assert!(display_name(key).is_some(), "{key} has no display name");
            assert_eq!((class.info)().name, *key);
        }
    }

    #[test]
    fn keys_are_unique() {
        let keys: HashSet<_> = NODE_CLASS_MAPPINGS.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), NODE_CLASS_MAPPINGS.len());
    }

    #[test]
    fn checkpoint_loader_is_registered() {
        assert!(node_class("HfCheckpointLoader").is_some());
        assert_eq!(display_name("HfCheckpointLoader"), Some("HuggingFace Checkpoint Loader"));
        assert!(node_class("CheckpointLoaderSimple").is_none());
    }

    #[test]
    fn required_inputs_keep_declaration_order() {
        let json = serde_json::to_string(&checkpoint::node_info().input).unwrap();
        assert_eq!(
            json,
            r#"{"required":{"model_name":["STRING"],"revision":["STRING",{"default":"main"}]}}"#
        );
    }
}
