pub mod config;
pub mod core;
pub mod fetcher;
pub mod models;
pub mod server;

pub use crate::config::AppConfig;
pub use crate::core::resolver::SnapshotResolver;
pub use crate::core::trigger::TriggerClient;
pub use crate::models::{Environment, Scope, Snapshot};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
