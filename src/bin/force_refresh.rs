use clap::Parser;
use std::process::ExitCode;
use uzs_rates_lib::{AppConfig, Scope, SnapshotResolver};

/// Trigger the scraper for one scope and resolve the snapshot once.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value_t = Scope::Exchange)]
    scope: Scope,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    uzs_rates_lib::init_tracing();
    let config = AppConfig::from_env()?;
    let args = Args::parse();

    println!("Environment: {}", config.environment);
    println!("Triggering '{}' refresh...", args.scope);

    let resolver = SnapshotResolver::from_config(&config);
    match resolver.resolve_snapshot(args.scope).await {
        Some(snapshot) => {
            println!("Last updated: {}", snapshot.last_updated().unwrap_or("unknown"));
            println!("Sections: {}", snapshot.keys().collect::<Vec<_>>().join(", "));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No snapshot available from any source.");
            Ok(ExitCode::FAILURE)
        }
    }
}
