use crate::core::holder::{RefreshOutcome, SnapshotHolder};
use crate::core::resolver::SnapshotResolver;
use crate::models::Scope;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Schedule periodic refreshes into `holder`, plus one immediate run.
pub async fn init(
    resolver: Arc<SnapshotResolver>,
    holder: Arc<SnapshotHolder>,
    scope: Scope,
    cron: &str,
) -> Result<JobScheduler, anyhow::Error> {
    let sched = JobScheduler::new().await?;
    let resolver_clone = resolver.clone();
    let holder_clone = holder.clone();

    sched
        .add(Job::new_async(cron, move |_uuid, _l| {
            let resolver = resolver_clone.clone();
            let holder = holder_clone.clone();
            Box::pin(async move {
                tracing::info!(%scope, "Running scheduled refresh");
                run_refresh(&resolver, &holder, scope).await;
            })
        })?)
        .await?;

    // Startup refresh, so the holder is populated before the first tick
    tokio::spawn(async move {
        tracing::info!(%scope, "Running startup refresh");
        run_refresh(&resolver, &holder, scope).await;
    });

    sched.start().await?;
    Ok(sched)
}

pub async fn run_refresh(resolver: &SnapshotResolver, holder: &SnapshotHolder, scope: Scope) -> RefreshOutcome {
    let outcome = holder.refresh(resolver, scope).await;

    match outcome {
        RefreshOutcome::Updated => {
            if let Some(held) = holder.current().await {
                tracing::info!(
                    last_updated = held.snapshot.last_updated().unwrap_or("unknown"),
                    refreshed_at = %held.last_refreshed.format("%H:%M:%S"),
                    "Snapshot updated"
                );
            }
        }
        RefreshOutcome::KeptPrevious => {
            tracing::warn!("Refresh failed, still serving the previous snapshot");
        }
        RefreshOutcome::Unavailable => {
            tracing::error!("Refresh failed and no snapshot has been resolved yet");
        }
    }

    outcome
}
