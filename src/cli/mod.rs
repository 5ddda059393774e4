use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hf-nodes")]
#[command(
	version,
	about = "Load diffusion checkpoints from HuggingFace as graph nodes",
	long_about = None
)]
pub struct Cli {
	/// HuggingFace access token for gated or private repositories
	#[arg(long, env = "HF_TOKEN", global = true, hide_env_values = true)]
	pub token: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Download a checkpoint and load it, printing a summary of the outputs
	Load {
		/// HuggingFace model repository ID (e.g., "org/model-x")
		model_name: String,

		/// Revision to request (currently ignored; "main" is always loaded)
		#[arg(long, default_value = "main")]
		revision: String,

		/// Device to run on (e.g., "cpu" or "cuda:0")
		#[arg(long, default_value = "cpu")]
		device: String,
	},

	/// Print the registered nodes as JSON
	Nodes,

	/// Print the search paths for a folder category
	Paths {
		/// Folder category (e.g., "embeddings")
		category: String,
	},

	/// Start the HTTP API server
	Serve {
		/// Device to run on (e.g., "cpu" or "cuda:0")
		#[arg(long, default_value = "cpu")]
		device: String,

		/// Port to listen on
		#[arg(long, default_value = "8188")]
		port: u16,

		/// Host to bind to
		#[arg(long, default_value = "127.0.0.1")]
		host: String,
	},
}
