//! switchboard: HTTP service running the supervisor/worker state machine.
//!
//! Configuration comes from a TOML file (`--config`, `SWITCHBOARD_CONFIG`, or
//! `config/switchboard.toml`), with secrets and endpoints overridable from the
//! environment or a `.env` file. Requires OPENAI_API_KEY unless the configured
//! endpoint does not need one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use switchboard::checkpoint::CheckpointStoreBuilder;
use switchboard::config::{ConfigurationLoader, EnvironmentLoader};
use switchboard::observability::{init_tracing, Logger};
use switchboard::orchestration::OrchestratorBuilder;
use switchboard::provider::OpenAiCompatibleProvider;
use switchboard::server::{self, AppState};
use switchboard::tools::{board::board_store_from_config, ToolRegistry, Workspace};

#[derive(Parser)]
#[command(name = "switchboard", version, about = "Supervisor/worker delegation service")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "SWITCHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// .env file to load before reading the environment
    #[arg(long, env = "SWITCHBOARD_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Listen address (overrides [server] addr)
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // The .env file may set SWITCHBOARD_CONFIG, so parse again once it is loaded
    let env = EnvironmentLoader::new(Some(&Args::parse().env_file));
    let args = Args::parse();

    let mut loader = ConfigurationLoader::new(args.config.as_deref())?;
    env.apply_overrides(&mut loader.config);
    if let Some(addr) = args.addr {
        loader.config.server.addr = addr;
    }
    let config = loader.config;

    init_tracing(&config.logging.log_level);
    if let Some(error) = env.load_error() {
        tracing::warn!(path = %args.env_file.display(), error = %error, "failed to load .env file");
    }
    tracing::info!(
        config = %loader.config_path.display(),
        backend = %config.checkpointing.backend,
        version = %config.agent.version,
        "starting switchboard"
    );

    let store = CheckpointStoreBuilder::from_config(&config.checkpointing)
        .build()
        .await
        .context("Failed to open checkpoint store")?;
    if !store.is_available().await {
        tracing::warn!(backend = store.backend_type(), "checkpoint store is not reachable yet");
    }

    let boards = board_store_from_config(&config.checkpointing)
        .await
        .context("Failed to open board store")?;
    let registry = ToolRegistry::standard(
        Workspace::new(&config.tools.workspace_root),
        config.tools.max_read_chars,
        boards.clone(),
    );

    let provider = Arc::new(OpenAiCompatibleProvider::from_config(&config.llm, env.api_key()));
    if env.api_key().is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; model calls are sent without credentials");
    }

    let mut builder = OrchestratorBuilder::new(store, provider.clone(), provider)
        .with_tools(registry)
        .with_config(config.clone());
    if let Some(log_file) = &config.logging.log_file {
        let logger = Logger::new(Some(Path::new(log_file)), Some(&config.logging.log_level))?;
        tracing::info!(transcript = %logger.log_file().display(), "writing transcript");
        builder = builder.with_logger(Arc::new(logger));
    }
    let orchestrator = builder.build()?;

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        boards,
    };
    server::serve(&config.server.addr, state, &config.server.cors_origins).await
}
