//! pulse-web - SessionPulse feedback collection & analytics service
//!
//! Attendees submit structured survey responses through share-token URLs;
//! administrators manage sessions, watch live updates, export reports, and
//! request AI narrative summaries.

use anyhow::Result;
use clap::Parser;
use pulse_common::config::ServiceConfig;
use pulse_web::{build_router, db, AppState};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pulse-web", about = "SessionPulse feedback service")]
struct Args {
    /// Path to a TOML config file (default: platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the database path from config
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting SessionPulse (pulse-web) v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        config.database_path = database;
    }
    info!("Database path: {}", config.database_path.display());

    let pool = db::init_database(&config.database_path).await?;

    let bind_address = config.bind_address.clone();
    let state = AppState::new(pool, config);

    // Prime the read model before serving
    state.read_model.refresh(&state.db).await;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("pulse-web listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
