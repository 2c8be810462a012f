use clap::Parser;
use std::sync::Arc;
use uzs_rates_lib::server::{self, ControlState, ScraperCommand};
use uzs_rates_lib::AppConfig;

/// Local control server: runs the scraper when the dashboard asks for a refresh.
#[derive(Parser, Debug)]
#[command(name = "uzs-rates", version)]
struct Args {
    #[arg(long, env = "CONTROL_PORT", default_value_t = server::DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "CONTROL_HOST", default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    uzs_rates_lib::init_tracing();
    let config = AppConfig::from_env()?;
    let args = Args::parse();

    let scraper = ScraperCommand::from_config(&config);
    tracing::info!(program = %scraper.program, args = ?scraper.args, "Scraper command configured");

    let state = Arc::new(ControlState::new(scraper));
    server::start(&args.host, args.port, state).await
}
