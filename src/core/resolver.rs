use crate::config::AppConfig;
use crate::core::clock::{CacheBuster, SystemClock};
use crate::core::trigger::TriggerClient;
use crate::fetcher::bundled::BundledSnapshotFetcher;
use crate::fetcher::cbu::CbuFetcher;
use crate::fetcher::remote::RemoteSnapshotFetcher;
use crate::fetcher::SnapshotSource;
use crate::models::{Environment, Scope, Snapshot};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Bundled,
    Remote,
    Emergency,
}

/// Fetch order per environment.
///
/// Local development reads the file the scraper just wrote first, then the
/// published copy, then the bundled file once more. Deployed builds prefer the
/// published copy and fall back to whatever shipped with the bundle.
pub fn candidate_plan(environment: Environment) -> &'static [CandidateKind] {
    match environment {
        Environment::LocalDev => &[CandidateKind::Bundled, CandidateKind::Remote, CandidateKind::Bundled],
        Environment::Deployed => &[CandidateKind::Remote, CandidateKind::Bundled],
    }
}

/// Produces the freshest snapshot available, or `None` once every source failed.
///
/// Holds no state between calls: nothing is cached and nothing is retried.
pub struct SnapshotResolver {
    environment: Environment,
    trigger: TriggerClient,
    bundled: Arc<dyn SnapshotSource>,
    remote: Arc<dyn SnapshotSource>,
    emergency: Option<Arc<dyn SnapshotSource>>,
    clock: Arc<dyn CacheBuster>,
}

impl SnapshotResolver {
    pub fn new(
        environment: Environment,
        trigger: TriggerClient,
        bundled: Arc<dyn SnapshotSource>,
        remote: Arc<dyn SnapshotSource>,
    ) -> Self {
        Self {
            environment,
            trigger,
            bundled,
            remote,
            emergency: None,
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let trigger = TriggerClient::new(&config.control_url, config.environment, config.trigger_timeout);
        let bundled = Arc::new(BundledSnapshotFetcher::new(config.bundled_url(), config.fetch_timeout));
        let remote = Arc::new(RemoteSnapshotFetcher::new(&config.remote_url, config.fetch_timeout));

        let mut resolver = Self::new(config.environment, trigger, bundled, remote);
        if config.enable_cbu_fallback {
            resolver = resolver.with_emergency_source(Arc::new(CbuFetcher::new(&config.cbu_url, config.fetch_timeout)));
        }
        resolver
    }

    pub fn with_clock(mut self, clock: Arc<dyn CacheBuster>) -> Self {
        self.clock = clock;
        self
    }

    /// Extra source tried only after the environment's whole plan failed.
    pub fn with_emergency_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.emergency = Some(source);
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The ordered sources one resolution will walk through.
    pub fn candidates(&self) -> Vec<Arc<dyn SnapshotSource>> {
        let mut plan: Vec<CandidateKind> = candidate_plan(self.environment).to_vec();
        if self.emergency.is_some() {
            plan.push(CandidateKind::Emergency);
        }

        plan.into_iter()
            .filter_map(|kind| match kind {
                CandidateKind::Bundled => Some(self.bundled.clone()),
                CandidateKind::Remote => Some(self.remote.clone()),
                CandidateKind::Emergency => self.emergency.clone(),
            })
            .collect()
    }

    /// Trigger a scraper run (best effort), then walk the candidates in order.
    ///
    /// The trigger is not awaited for completion of the scraper run itself, so the
    /// snapshot returned may predate the refresh that was just requested.
    pub async fn resolve_snapshot(&self, scope: Scope) -> Option<Snapshot> {
        // 1. Best-effort trigger; its error never crosses this boundary
        self.trigger.notify_refresh_best_effort(scope).await;

        // 2. Ordered fallback with early return
        let candidates = self.candidates();
        let total = candidates.len();

        for (i, source) in candidates.iter().enumerate() {
            let token = self.clock.next_token();

            match source.fetch_snapshot(token).await {
                Ok(snapshot) => {
                    tracing::info!(
                        source = source.name(),
                        attempt = i + 1,
                        last_updated = snapshot.last_updated().unwrap_or("unknown"),
                        "Snapshot resolved"
                    );
                    return Some(snapshot);
                }
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        url = source.base_url(),
                        attempt = i + 1,
                        total,
                        "Snapshot source failed, trying next: {:#}",
                        e
                    );
                }
            }
        }

        // 3. Exhausted
        tracing::error!(%scope, environment = %self.environment, "All snapshot sources failed");
        None
    }
}
