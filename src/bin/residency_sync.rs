//! Residency Sync CLI
//!
//! Usage:
//!   cargo run --features cli --bin residency_sync -- sync
//!   cargo run --features cli --bin residency_sync -- merge \
//!     --target 6f1c... --source 0b2e... --source 9d4a...
//!   cargo run --features cli --bin residency_sync -- serve
//!   cargo run --features cli --bin residency_sync -- --memory serve
//!
//! Configuration comes from the environment (and `.env`): DATABASE_URL,
//! SOURCE_JWT_TOKEN, ADMIN_PASSWORD, BIND_ADDR, SYNC_HOUR_UTC, ...

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use residency_sync::{
    api::{create_router, ApiState},
    config::AppConfig,
    scheduler,
    store::{DatabaseConfig, InMemoryStore, PgStore, ResidencyStore},
    CompanyId, MergeEngine, SyncService,
};

/// Residency listing sync and company curation
#[derive(Parser, Debug)]
#[command(name = "residency_sync")]
#[command(about = "Sync residency listings and curate companies")]
struct Args {
    /// Use the in-memory store instead of PostgreSQL (state is lost on exit)
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one sync now
    Sync,

    /// Merge duplicate companies into a target
    Merge {
        /// Company that survives
        #[arg(long)]
        target: Uuid,

        /// Company to absorb (repeatable)
        #[arg(long = "source", required = true)]
        sources: Vec<Uuid>,
    },

    /// Serve the REST API with the daily sync scheduler
    Serve,

    /// Run only the daily sync scheduler
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "residency_sync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let store = open_store(&config, args.memory).await?;
    let sync = SyncService::new(config.source.clone(), store.clone());

    match args.command {
        Command::Sync => {
            let report = sync.run().await.context("Sync failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Merge { target, sources } => {
            let engine = MergeEngine::new(store);
            let sources: Vec<CompanyId> = sources.into_iter().map(CompanyId).collect();
            let report = engine
                .merge(CompanyId(target), &sources)
                .await
                .context("Merge failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Serve => {
            if config.admin_password.is_none() {
                tracing::warn!("ADMIN_PASSWORD is not set; admin endpoints will return 500");
            }

            let scheduler_handle =
                tokio::spawn(scheduler::run_daily(sync.clone(), config.schedule));

            let state = ApiState::new(store, sync, config.admin_password.clone());
            let app = create_router(state);

            let listener = tokio::net::TcpListener::bind(&config.bind_addr)
                .await
                .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
            tracing::info!(addr = %config.bind_addr, "Residency API listening");

            let served = axum::serve(listener, app).await;
            scheduler_handle.abort();
            served.context("Server error")?;
        }

        Command::Schedule => {
            scheduler::run_daily(sync, config.schedule).await;
        }
    }

    Ok(())
}

async fn open_store(config: &AppConfig, memory: bool) -> Result<Arc<dyn ResidencyStore>> {
    if memory {
        tracing::info!("Using in-memory store");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let db_config = DatabaseConfig::new(&config.database_url, config.database_pool_size);
    let store = PgStore::connect(&db_config)
        .await
        .context("Failed to connect to database")?;
    store
        .ensure_schema()
        .await
        .context("Failed to create schema")?;

    Ok(Arc::new(store))
}
