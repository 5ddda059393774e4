mod cli;

use anyhow::Context;
use candle_core::Device;
use clap::Parser;
use cli::{Cli, Commands};
use hf_nodes::config::Config;
use hf_nodes::error::{Error, Result};
use hf_nodes::host::{ConfigFolderPaths, FolderPathProvider};
use hf_nodes::nodes::{self, CheckpointLoaderInputs};
use hf_nodes::server;

fn parse_device(device_str: &str) -> Result<Device> {
    match device_str {
        "cpu" => Ok(Device::Cpu),
        s if s.starts_with("cuda") => {
            let parts: Vec<&str> = s.split(':').collect();
            let ordinal = if parts.len() > 1 {
                parts[1]
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidInput(format!("Invalid CUDA device: {}", s)))?
            } else {
                0
            };
            Device::new_cuda(ordinal)
                .map_err(|e| Error::Config(format!("Failed to initialize CUDA device: {}", e)))
        }
        _ => Err(Error::InvalidInput(format!("Unknown device: {}", device_str))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("failed to resolve configuration")?;
    if cli.token.is_some() {
        config.hf_token = cli.token.clone();
    }

    match cli.command {
        Commands::Load {
            model_name,
            revision,
            device,
        } => {
            let device = parse_device(&device)?;
            let node = nodes::default_checkpoint_loader(&config, device)?;

            let inputs = CheckpointLoaderInputs {
                model_name: model_name.clone(),
                revision,
            };
            let loaded = tokio::task::spawn_blocking(move || node.execute(&inputs))
                .await
                .context("checkpoint loader task failed")?
                .with_context(|| format!("failed to load {}", model_name))?;

            let output = serde_json::json!({
                "model_name": model_name,
                "outputs": {
                    "MODEL": loaded.model.summary(),
                    "CLIP": loaded.clip.summary(),
                    "VAE": loaded.vae.summary(),
                },
            });

            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Nodes => {
            println!("{}", serde_json::to_string_pretty(&nodes::all_node_info())?);
        }

        Commands::Paths { category } => {
            let folders = ConfigFolderPaths::from_config(&config)?;
            for path in folders.get_folder_paths(&category)? {
                println!("{}", path.display());
            }
        }

        Commands::Serve { device, port, host } => {
            let device = parse_device(&device)?;
            let device_name = format!("{:?}", device);

            let node = nodes::default_checkpoint_loader(&config, device)?;
            let state = server::AppState::new(node, device_name.clone());

            println!("🚀 hf-nodes server starting...");
            println!("   Device: {}", device_name);
            println!("   Listening on: http://{}:{}", host, port);
            println!("   Nodes: http://{}:{}/object_info", host, port);
            println!("   Execute: http://{}:{}/api/execute", host, port);

            server::serve(&host, port, state).await?;
        }
    }

    Ok(())
}
