//! assistant-core - Message and Decision Orchestration Service
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP server (default)
//! cargo run --release
//!
//! # Route one message through the pipeline
//! ./assistant-core process "What is the weather like today?"
//!
//! # Run one decision against the configured backend
//! ./assistant-core decide "Create a task to renew the domain" --platform mobile
//! ./assistant-core decide "" --audio memo.wav
//! ```
//!
//! # Environment Variables
//!
//! - `ASSISTANT_CONFIG`: Path to the TOML config (default: `./assistant.toml`)
//! - `INTERNAL_API_URL`: Backend collaborator base URL
//! - `API_KEY`: Credential for the backend and for `/api/*`
//! - `ASSISTANT_SERVER_ADDR`: HTTP bind address
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe the decision store on startup

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use assistant_core::api::{create_app, ApiState};
use assistant_core::config::AppConfig;
use assistant_core::orchestrator::{DecisionOrchestrator, DecisionRequest, DecisionSettings};
use assistant_core::pipeline::{Metadata, Pipeline};
use assistant_core::storage::{open_store, DataDirLock};
use assistant_core::HttpBackendClient;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "assistant-core")]
#[command(about = "Message pipeline and decision orchestrator for a multi-platform assistant")]
#[command(version)]
struct CliArgs {
    /// Path to the TOML config (overrides ASSISTANT_CONFIG and ./assistant.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long)]
    addr: Option<String>,

    /// Wipe the configured decision store on startup.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the HTTP server (the default when no subcommand is given)
    Serve,

    /// Route one message through the pipeline and print the result
    Process {
        message: String,
        #[arg(long)]
        session_id: Option<String>,
        /// Force an intent instead of running the heuristics
        #[arg(long)]
        intent: Option<String>,
    },

    /// Run one decision against the configured backend and print the record
    Decide {
        text: String,
        #[arg(long, default_value = "web")]
        platform: String,
        #[arg(long, default_value = "desktop")]
        device: String,
        /// Audio file to transcribe; marks the request as voice input
        #[arg(long, value_name = "FILE")]
        audio: Option<PathBuf>,
    },
}

// ============================================================================
// Reset
// ============================================================================

/// Check if the store should be reset (CLI flag or RESET_DB env var).
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    std::env::var("RESET_DB").is_ok_and(|val| {
        let val = val.to_lowercase();
        val == "true" || val == "1" || val == "yes"
    })
}

// ============================================================================
// Modes
// ============================================================================

fn run_process(message: &str, session_id: Option<&str>, intent: Option<&str>) -> Result<()> {
    let metadata: Option<Metadata> = intent.map(|label| {
        let mut meta = Metadata::new();
        meta.insert("intent".to_string(), Value::String(label.to_string()));
        meta
    });

    let result = Pipeline::new().process(message, session_id, metadata.as_ref());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn build_orchestrator(config: &AppConfig) -> Result<DecisionOrchestrator> {
    let store = open_store(&config.storage).context("Failed to open decision store")?;
    let backend =
        HttpBackendClient::new(&config.backend).context("Failed to build backend client")?;
    info!(base_url = %backend.base_url(), "Backend client ready");

    Ok(DecisionOrchestrator::new(
        Arc::new(backend),
        store,
        DecisionSettings::from_config(config),
    ))
}

async fn run_decide(
    orchestrator: &DecisionOrchestrator,
    text: String,
    platform: String,
    device: String,
    audio: Option<&Path>,
) -> Result<()> {
    let audio = match audio {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read audio file: {}", path.display()))?,
        ),
        None => None,
    };

    let request = DecisionRequest {
        input_text: text,
        platform,
        device_context: device,
        voice_input: audio.is_some(),
        audio,
    };

    let record = orchestrator.decide(request).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn serve(config: &AppConfig, orchestrator: DecisionOrchestrator) -> Result<()> {
    let state = ApiState::new(Pipeline::new(), orchestrator, &config.server);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!(
        addr = %config.server.addr,
        auth = config.server.api_key.is_some(),
        "✓ HTTP server listening"
    );

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await
        .context("HTTP server error")?;

    info!("✓ assistant-core shutdown complete");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // The pipeline needs no config, store or backend
    if let Some(SubCommand::Process {
        message,
        session_id,
        intent,
    }) = &args.command
    {
        return run_process(message, session_id.as_deref(), intent.as_deref());
    }

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
        config.validate()?;
    }

    let _data_lock = DataDirLock::prepare(&config.storage, should_reset_db(args.reset_db))
        .context("Failed to prepare data directory")?;

    let orchestrator = build_orchestrator(&config)?;

    match args.command {
        Some(SubCommand::Decide {
            text,
            platform,
            device,
            audio,
        }) => run_decide(&orchestrator, text, platform, device, audio.as_deref()).await,
        _ => serve(&config, orchestrator).await,
    }
}
