use crate::core::clock::with_cache_buster;
use crate::models::Snapshot;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

pub mod bundled;
pub mod cbu;
pub mod remote;

pub const CLIENT_USER_AGENT: &str = "UzsRates/1.0";

/// One candidate location a snapshot can be fetched from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    fn name(&self) -> &str;

    /// Base URL before the cache-busting token is appended.
    fn base_url(&self) -> &str;

    async fn fetch_snapshot(&self, cache_buster: u64) -> Result<Snapshot>;
}

/// Shared client setup for every snapshot source.
pub fn build_client(timeout: Option<Duration>) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().unwrap_or_else(|_| Client::new())
}

/// GET `base_url?t=<token>` and parse the body as a full snapshot.
pub(crate) async fn fetch_snapshot_json(
    client: &Client,
    source: &str,
    base_url: &str,
    cache_buster: u64,
) -> Result<Snapshot> {
    let url = with_cache_buster(base_url, cache_buster)?;
    tracing::debug!(source, %url, "Fetching snapshot");

    let resp = client.get(url).send().await?;

    if !resp.status().is_success() {
        return Err(anyhow!("{} returned status {}", source, resp.status()));
    }

    let body = resp.bytes().await?;
    Snapshot::from_slice(&body).map_err(|e| anyhow!("{} returned an unusable snapshot: {:#}", source, e))
}
