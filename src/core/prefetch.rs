use crate::fetcher::build_client;
use crate::models::{CurrencyRates, Snapshot, CURRENCY_CODES};
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PREFETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    Downloaded,
    KeptExisting,
    WroteFallback,
}

/// Copy the published snapshot into the bundle before a build.
///
/// Never leaves the bundle without a `rates.json`: on failure the existing file
/// is kept, or a minimal document is written so the front end still loads.
pub async fn prefetch_snapshot(url: &str, target: &Path, timeout: Duration) -> Result<PrefetchOutcome> {
    tracing::info!(%url, "Fetching published snapshot");

    match download(url, timeout).await {
        Ok(body) => {
            write_atomically(target, &body).await?;
            tracing::info!(target = %target.display(), "Successfully fetched rates.json");
            return Ok(PrefetchOutcome::Downloaded);
        }
        Err(e) => tracing::warn!("Failed to fetch published snapshot: {:#}", e),
    }

    if tokio::fs::try_exists(target).await.unwrap_or(false) {
        tracing::info!(target = %target.display(), "Using existing local rates.json");
        return Ok(PrefetchOutcome::KeptExisting);
    }

    tracing::warn!("No local rates.json found, writing a minimal fallback file");
    let fallback = fallback_snapshot(&Local::now().format("%Y-%m-%d %H:%M").to_string());
    write_atomically(target, fallback.to_json_pretty()?.as_bytes()).await?;
    Ok(PrefetchOutcome::WroteFallback)
}

async fn download(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let client = build_client(Some(timeout));
    let resp = client.get(url).send().await?;

    if !resp.status().is_success() {
        return Err(anyhow!("status {}", resp.status()));
    }

    let body = resp.bytes().await?.to_vec();
    Snapshot::from_slice(&body)?;
    Ok(body)
}

async fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp = target.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, target)
        .await
        .with_context(|| format!("Failed to move snapshot into {}", target.display()))?;
    Ok(())
}

/// Smallest document the front end renders without crashing.
pub fn fallback_snapshot(last_updated: &str) -> Snapshot {
    let mut map = Map::new();
    map.insert("last_updated".to_string(), Value::String(last_updated.to_string()));

    let empty = json!({
        "cbu": 0,
        "cbu_last_updated": CurrencyRates::empty().cbu_last_updated,
        "history": [],
        "banks": []
    });
    for code in CURRENCY_CODES {
        map.insert(code.to_string(), empty.clone());
    }

    let empty_series = json!({ "last_updated": "N/A", "data": [] });
    map.insert(
        "weather".to_string(),
        json!({
            "city": "Tashkent",
            "aqi": 0,
            "temp": 0,
            "humidity": 0,
            "icon": "50d",
            "last_updated": "N/A"
        }),
    );
    map.insert("savings".to_string(), empty_series.clone());
    map.insert("news".to_string(), json!({ "last_updated": "N/A", "items": [] }));
    map.insert("gold_bars".to_string(), json!([]));
    map.insert("gold_history".to_string(), empty_series.clone());
    map.insert("silver_history".to_string(), empty_series.clone());
    map.insert("bitcoin_history".to_string(), empty_series);

    Snapshot::from_map_unchecked(map)
}
