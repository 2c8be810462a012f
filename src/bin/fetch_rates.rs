use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use uzs_rates_lib::core::prefetch::{self, PrefetchOutcome};
use uzs_rates_lib::AppConfig;

/// Copy the published snapshot into the front-end bundle before a build.
#[derive(Parser, Debug)]
struct Args {
    /// Overrides SNAPSHOT_OUTPUT
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seconds before giving up on the published copy
    #[arg(long, default_value_t = prefetch::DEFAULT_PREFETCH_TIMEOUT.as_secs())]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    uzs_rates_lib::init_tracing();
    let config = AppConfig::from_env()?;
    let args = Args::parse();

    let target = args.output.unwrap_or_else(|| config.snapshot_output.clone());
    let outcome = prefetch::prefetch_snapshot(&config.remote_url, &target, Duration::from_secs(args.timeout)).await?;

    match outcome {
        PrefetchOutcome::Downloaded => println!("Fetched published snapshot into {}", target.display()),
        PrefetchOutcome::KeptExisting => println!("Kept existing {}", target.display()),
        PrefetchOutcome::WroteFallback => println!("Wrote minimal fallback to {}", target.display()),
    }
    Ok(())
}
