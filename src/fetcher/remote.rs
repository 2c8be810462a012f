use super::{build_client, fetch_snapshot_json, SnapshotSource};
use crate::models::Snapshot;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Snapshot published by CI to the data branch of the repository.
pub struct RemoteSnapshotFetcher {
    client: Client,
    url: String,
}

impl RemoteSnapshotFetcher {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client: build_client(timeout),
            url: url.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for RemoteSnapshotFetcher {
    fn name(&self) -> &str {
        "remote"
    }

    fn base_url(&self) -> &str {
        &self.url
    }

    async fn fetch_snapshot(&self, cache_buster: u64) -> Result<Snapshot> {
        fetch_snapshot_json(&self.client, self.name(), &self.url, cache_buster).await
    }
}
