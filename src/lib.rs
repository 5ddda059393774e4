//! A graph node that pulls a diffusion checkpoint from the HuggingFace Hub
//! and loads it into denoiser, text-encoder and VAE handles.

pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod nodes;
pub mod server;

pub use error::{Error, Result};
