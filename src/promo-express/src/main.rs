//! Promo Express: incentive rule builder service for airline promos.
//!
//! `serve` starts the wizard API. `validate` and `preview` run the rule
//! builder offline against a saved form.

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use clap::{Parser, Subcommand};
use promo_core::config::AppConfig;
use promo_rewards::{validate_form, AudienceGate, IncentiveEngine, IncentiveForm};
use promo_wizard::{
    DraftStorage, FileDraftStorage, HttpRewardsBackend, IncentiveStep, MemoryDraftStorage,
    MemoryRewardsBackend, RewardsBackend, SessionStore, WizardState,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "promo-express")]
#[command(about = "Incentive rule builder for airline promos")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, global = true, env = "PROMO_EXPRESS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Business the operator acts for (overrides config)
    #[arg(long, global = true, env = "PROMO_EXPRESS__WIZARD__BUSINESS_ID")]
    business_id: Option<String>,

    /// Reward API base URL (overrides config)
    #[arg(long, global = true, env = "PROMO_EXPRESS__BACKEND__BASE_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the wizard API (default)
    Serve {
        /// Use the in-memory reward API instead of the configured one
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Validate a saved incentive form and print every field error
    Validate { file: PathBuf },
    /// Print the reward API payload a saved incentive form produces
    Preview { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promo_express=info,promo_wizard=info,promo_rewards=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(business_id) = cli.business_id {
        config.wizard.business_id = business_id;
    }
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }

    match cli.command.unwrap_or(Command::Serve { offline: false }) {
        Command::Serve { offline } => serve(config, offline).await,
        Command::Validate { file } => validate(&file),
        Command::Preview { file } => preview(&config, &file),
    }
}

async fn serve(config: AppConfig, offline: bool) -> anyhow::Result<()> {
    info!(
        business_id = %config.wizard.business_id,
        http_port = config.api.http_port,
        backend = %config.backend.base_url,
        offline,
        "Promo Express starting up"
    );

    let storage: Arc<dyn DraftStorage> = match &config.wizard.storage_dir {
        Some(dir) => Arc::new(FileDraftStorage::new(dir)?),
        None => Arc::new(MemoryDraftStorage::new()),
    };
    let backend: Arc<dyn RewardsBackend> = if offline {
        Arc::new(MemoryRewardsBackend::new())
    } else {
        Arc::new(HttpRewardsBackend::new(&config.backend)?)
    };

    let engine = Arc::new(IncentiveEngine::new(
        config.wizard.business_id.clone(),
        &config.subscriptions,
    ));
    let sessions = SessionStore::new(storage, config.wizard.storage_key.clone());
    let step = IncentiveStep::new(
        backend,
        sessions,
        engine,
        config.backend.language.clone(),
        &config.wizard,
    );

    if config.metrics.enabled {
        if let Err(e) = start_metrics(&config) {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(promo_wizard::wizard_router(WizardState {
            step: Arc::new(step),
        }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.api.host.parse()?, config.api.http_port);
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn start_metrics(config: &AppConfig) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(SocketAddr::new(
            config.api.host.parse()?,
            config.metrics.port,
        ))
        .install()?;
    info!(port = config.metrics.port, "Metrics exporter started");
    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn read_form(file: &Path) -> anyhow::Result<IncentiveForm> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))
}

fn validate(file: &Path) -> anyhow::Result<()> {
    let form = read_form(file)?;
    match validate_form(&form) {
        Ok(rules) => {
            info!(audiences = rules.items.len(), "Incentive form is valid");
            Ok(())
        }
        Err(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            anyhow::bail!(report)
        }
    }
}

/// Offline preview: no subscription state is available, so the audience
/// gate applies no restriction.
fn preview(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let form = read_form(file)?;
    let engine = IncentiveEngine::new(config.wizard.business_id.clone(), &config.subscriptions);
    let payload = engine.prepare(&form, &AudienceGate::unrestricted())?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
