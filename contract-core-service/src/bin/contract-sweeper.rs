//! Contract sweeper - periodic expiry reminders, renewal drafts and expiry
//!
//! Usage:
//!   contract-sweeper --database-url postgres://... --sweep-interval-secs 3600
//!
//! Environment variables:
//!   DATABASE_URL - Postgres connection string
//!   SWEEP_INTERVAL_SECS - Seconds between sweeps (default: 3600)
//!   LOG_LEVEL - Default tracing filter when RUST_LOG is unset (default: info)
//!   RUN_ONCE - Run both sweeps once and exit
//!
//! Several sweepers may point at the same database; the advisory job lock
//! lets only one of them run a given sweep at a time.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use contract_core_postgres::{init_database, PgAdvisoryJobLock, PostgresUnitOfWork};
use contract_core_service::{
    ContractServices, HashSignatureValidator, RetryingEventPublisher, ServiceConfig,
    TracingEventSink,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "contract-sweeper")]
#[command(about = "Runs the contract expiry and renewal sweeps")]
#[command(version)]
struct Args {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Seconds between sweeps
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value = "3600")]
    sweep_interval_secs: u64,

    /// Default log filter
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run both sweeps once and exit
    #[arg(long, env = "RUN_ONCE")]
    run_once: bool,

    /// Connection pool size; a running sweep holds one connection for its lock
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "5")]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections.max(2))
        .connect(&args.database_url)
        .await
        .context("failed to connect to the contract database")?;
    init_database(&pool)
        .await
        .context("failed to initialize the contract schema")?;
    let pool = Arc::new(pool);

    let mut config = ServiceConfig::from_env();
    config.sweep_interval = Duration::from_secs(args.sweep_interval_secs.max(1));
    let events = RetryingEventPublisher::new(
        TracingEventSink,
        config.publish_attempts,
        config.publish_backoff,
    );
    let sweep_interval = config.sweep_interval;

    let services = ContractServices::new(
        Arc::new(PostgresUnitOfWork::new(pool.clone())),
        Arc::new(events),
        Arc::new(HashSignatureValidator),
        Arc::new(PgAdvisoryJobLock::new(pool)),
        config,
    );

    if args.run_once {
        let (expiring, expired) = services.scheduler.run_once(Utc::now()).await?;
        info!(?expiring, ?expired, "sweep finished");
        return Ok(());
    }

    info!(interval_secs = sweep_interval.as_secs(), "starting contract sweeper");
    let handle = services.scheduler.clone().spawn(sweep_interval);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
        result = handle => {
            if let Err(e) = result {
                error!(error = %e, "sweeper task stopped");
            }
        }
    }

    info!("contract sweeper shutting down");
    Ok(())
}
