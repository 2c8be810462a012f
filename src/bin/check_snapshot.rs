use std::process::ExitCode;
use uzs_rates_lib::models::CURRENCY_CODES;
use uzs_rates_lib::{AppConfig, Scope, SnapshotResolver};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    uzs_rates_lib::init_tracing();
    let config = AppConfig::from_env()?;

    println!("🔍 Diagnostic - {} ({})", config.environment, config.remote_url);

    let resolver = SnapshotResolver::from_config(&config);
    let Some(snapshot) = resolver.resolve_snapshot(Scope::Exchange).await else {
        eprintln!("No snapshot available from any source.");
        return Ok(ExitCode::FAILURE);
    };

    println!("Last updated: {}", snapshot.last_updated().unwrap_or("unknown"));
    println!(
        "\n{:<6} | {:<6} | {:<10} | {:<12} | {:<24} | {:<24}",
        "Code", "Banks", "CBU", "Latest", "Best buy", "Best sell"
    );
    println!("{}", "-".repeat(96));

    for code in CURRENCY_CODES {
        match snapshot.currency(code) {
            Ok(Some(rates)) => {
                let latest = rates.latest().map(|p| p.date.to_string()).unwrap_or_else(|| "-".to_string());
                let buy = rates
                    .best_buy()
                    .map(|b| format!("{} {:.0}", b.name, b.buy))
                    .unwrap_or_else(|| "-".to_string());
                let sell = rates
                    .best_sell()
                    .map(|b| format!("{} {:.0}", b.name, b.sell))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<6} | {:<6} | {:<10.2} | {:<12} | {:<24} | {:<24}",
                    code,
                    rates.banks.len(),
                    rates.cbu,
                    latest,
                    buy,
                    sell
                );
            }
            Ok(None) => println!("{:<6} | {:<6} | {:<10} | {:<12} | {:<24} | {:<24}", code, 0, "NO DATA", "-", "-", "-"),
            Err(e) => println!("{:<6} | error: {:#}", code, e),
        }
    }

    println!("\nDone.");
    Ok(ExitCode::SUCCESS)
}
