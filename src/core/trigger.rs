use crate::fetcher::CLIENT_USER_AGENT;
use crate::models::{Environment, Scope};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("control endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("control endpoint returned status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The endpoint answered with a 2xx.
    Accepted,
    /// Deployed builds have no control endpoint; nothing was sent.
    Skipped,
}

#[derive(Debug, Serialize)]
struct RefreshRequest {
    scope: Scope,
}

/// Asks the local control endpoint to re-run the scraper for a scope.
#[derive(Debug, Clone)]
pub struct TriggerClient {
    client: Client,
    endpoint: String,
    environment: Environment,
}

impl TriggerClient {
    pub fn new(endpoint: impl Into<String>, environment: Environment, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder().user_agent(CLIENT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.into(),
            environment,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single attempt, no retries. Callers are expected to log and drop the error.
    pub async fn notify_refresh(&self, scope: Scope) -> Result<TriggerOutcome, TriggerError> {
        if self.environment != Environment::LocalDev {
            return Ok(TriggerOutcome::Skipped);
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&RefreshRequest { scope })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TriggerError::Status(status.as_u16()));
        }

        Ok(TriggerOutcome::Accepted)
    }

    /// Fire-and-forget wrapper: the error never reaches the caller.
    pub async fn notify_refresh_best_effort(&self, scope: Scope) {
        match self.notify_refresh(scope).await {
            Ok(TriggerOutcome::Accepted) => {
                tracing::info!(%scope, "Backend scraper triggered successfully");
            }
            Ok(TriggerOutcome::Skipped) => {
                tracing::debug!(%scope, environment = %self.environment, "No control endpoint, trigger skipped");
            }
            Err(e) => {
                tracing::warn!(%scope, endpoint = %self.endpoint, "Backend trigger failed, proceeding with existing data: {}", e);
            }
        }
    }
}
