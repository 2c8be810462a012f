use clap::Parser;
use std::sync::Arc;
use uzs_rates_lib::core::holder::SnapshotHolder;
use uzs_rates_lib::core::scheduler;
use uzs_rates_lib::{AppConfig, Scope, SnapshotResolver};

/// Keep a snapshot in memory, refreshing it on a cron schedule.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value_t = Scope::Exchange)]
    scope: Scope,

    /// Overrides REFRESH_CRON (six fields, seconds first)
    #[arg(long)]
    cron: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    uzs_rates_lib::init_tracing();
    let config = AppConfig::from_env()?;
    let args = Args::parse();

    let cron = args.cron.unwrap_or_else(|| config.refresh_cron.clone());
    let resolver = Arc::new(SnapshotResolver::from_config(&config));
    let holder = Arc::new(SnapshotHolder::new());

    let mut sched = scheduler::init(resolver, holder, args.scope, &cron).await?;
    tracing::info!(%cron, scope = %args.scope, environment = %config.environment, "Scheduler initialized");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    sched.shutdown().await?;
    Ok(())
}
