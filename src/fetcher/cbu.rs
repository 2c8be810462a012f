use super::{build_client, SnapshotSource};
use crate::core::clock::with_cache_buster;
use crate::models::{CurrencyRates, Snapshot, CURRENCY_CODES};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Last-resort source: the central bank's own reference rates.
///
/// Produces a snapshot with reference rates only (no bank quotes, no history,
/// no auxiliary sections), which is still enough for the dashboard header.
pub struct CbuFetcher {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CbuRate {
    #[serde(rename = "Ccy")]
    ccy: String,
    #[serde(rename = "Rate")]
    rate: String,
    #[serde(rename = "Date", default)]
    date: Option<String>,
}

impl CbuFetcher {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client: build_client(timeout),
            url: url.into(),
        }
    }

    fn build_snapshot(rates: Vec<CbuRate>, last_updated: String) -> Result<Snapshot> {
        let mut map = Map::new();
        map.insert("last_updated".to_string(), Value::String(last_updated));

        let mut found = 0;
        for code in CURRENCY_CODES {
            let Some(entry) = rates.iter().find(|r| r.ccy.eq_ignore_ascii_case(code)) else {
                continue;
            };

            // "12850.55"; skip anything unparsable rather than inventing a zero
            let Ok(cbu) = entry.rate.trim().parse::<f64>() else {
                tracing::warn!(currency = code, rate = %entry.rate, "Unparsable CBU rate");
                continue;
            };

            let section = CurrencyRates {
                cbu,
                cbu_last_updated: entry.date.clone().unwrap_or_else(|| "N/A".to_string()),
                ..CurrencyRates::empty()
            };
            map.insert(code.to_string(), serde_json::to_value(section)?);
            found += 1;
        }

        if found == 0 {
            return Err(anyhow!("CBU response contained none of the supported currencies"));
        }

        Ok(Snapshot::from_map_unchecked(map))
    }
}

#[async_trait]
impl SnapshotSource for CbuFetcher {
    fn name(&self) -> &str {
        "cbu"
    }

    fn base_url(&self) -> &str {
        &self.url
    }

    async fn fetch_snapshot(&self, cache_buster: u64) -> Result<Snapshot> {
        let url = with_cache_buster(&self.url, cache_buster)?;
        tracing::debug!(source = self.name(), %url, "Fetching reference rates");

        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(anyhow!("CBU API Error: {}", resp.status()));
        }

        let rates: Vec<CbuRate> = resp.json().await?;
        let now = Local::now().format("%Y-%m-%d %H:%M").to_string();
        Self::build_snapshot(rates, now)
    }
}
