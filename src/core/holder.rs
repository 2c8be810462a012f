use crate::core::resolver::SnapshotResolver;
use crate::models::{Scope, Snapshot};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    /// Resolution failed; the previously held snapshot is still served.
    KeptPrevious,
    /// Resolution failed and nothing was ever resolved.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct HeldSnapshot {
    pub snapshot: Arc<Snapshot>,
    pub last_refreshed: DateTime<Local>,
}

/// Keeps the most recently resolved snapshot in memory.
///
/// A failed refresh never blanks what is already held.
#[derive(Debug, Default)]
pub struct SnapshotHolder {
    current: RwLock<Option<HeldSnapshot>>,
}

impl SnapshotHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<HeldSnapshot> {
        self.current.read().await.clone()
    }

    pub async fn refresh(&self, resolver: &SnapshotResolver, scope: Scope) -> RefreshOutcome {
        let resolved = resolver.resolve_snapshot(scope).await;
        self.apply(resolved).await
    }

    pub async fn apply(&self, resolved: Option<Snapshot>) -> RefreshOutcome {
        let mut current = self.current.write().await;
        match resolved {
            Some(snapshot) => {
                *current = Some(HeldSnapshot {
                    snapshot: Arc::new(snapshot),
                    last_refreshed: Local::now(),
                });
                RefreshOutcome::Updated
            }
            None if current.is_some() => RefreshOutcome::KeptPrevious,
            None => RefreshOutcome::Unavailable,
        }
    }
}
