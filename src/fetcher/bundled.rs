use super::{build_client, fetch_snapshot_json, SnapshotSource};
use crate::models::Snapshot;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// The `rates.json` shipped alongside the front end (same origin).
///
/// In local development this is the file the scraper writes, so it is usually
/// fresher than the published copy.
pub struct BundledSnapshotFetcher {
    client: Client,
    url: String,
}

impl BundledSnapshotFetcher {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client: build_client(timeout),
            url: url.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for BundledSnapshotFetcher {
    fn name(&self) -> &str {
        "bundled"
    }

    fn base_url(&self) -> &str {
        &self.url
    }

    async fn fetch_snapshot(&self, cache_buster: u64) -> Result<Snapshot> {
        fetch_snapshot_json(&self.client, self.name(), &self.url, cache_buster).await
    }
}
