use crate::models::Environment;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_RATES_REPO: &str = "brklyn498/Neouzsusd";
pub const DEFAULT_RATES_BRANCH: &str = "rates-data";
pub const DEFAULT_LOCAL_PATH: &str = "rates.json";
pub const DEFAULT_CONTROL_URL: &str = "http://localhost:3050/api/refresh";
pub const DEFAULT_CBU_URL: &str = "https://cbu.uz/common/json/";
pub const DEFAULT_REFRESH_CRON: &str = "0 */30 * * * *";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("{name} has no host: {value}")]
    MissingHost { name: &'static str, value: String },
    #[error("{name} must be one of local/deployed, got '{value}'")]
    InvalidEnvironment { name: &'static str, value: String },
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Everything the acquisition core needs, resolved once at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub app_origin: Url,
    pub remote_url: String,
    pub local_path: String,
    pub control_url: String,
    pub fetch_timeout: Option<Duration>,
    pub trigger_timeout: Option<Duration>,
    pub enable_cbu_fallback: bool,
    pub cbu_url: String,
    pub refresh_cron: String,
    pub scraper_program: String,
    pub scraper_script: PathBuf,
    pub snapshot_output: PathBuf,
}

impl AppConfig {
    /// Load from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // 1. Where the front end lives, and therefore which environment we are in
        let origin_raw = get("APP_ORIGIN").unwrap_or_else(|| DEFAULT_APP_ORIGIN.to_string());
        let app_origin = Url::parse(&origin_raw).map_err(|_| ConfigError::InvalidUrl {
            name: "APP_ORIGIN",
            value: origin_raw.clone(),
        })?;

        let environment = match get("RATES_ENV") {
            Some(value) => value
                .parse::<Environment>()
                .map_err(|_| ConfigError::InvalidEnvironment { name: "RATES_ENV", value })?,
            None => {
                let host = app_origin.host_str().ok_or_else(|| ConfigError::MissingHost {
                    name: "APP_ORIGIN",
                    value: origin_raw.clone(),
                })?;
                Environment::from_host(host)
            }
        };

        // 2. Snapshot locations
        let remote_url = match get("RATES_URL") {
            Some(url) => url,
            None => remote_snapshot_url(
                &get("RATES_REPO").unwrap_or_else(|| DEFAULT_RATES_REPO.to_string()),
                &get("RATES_BRANCH").unwrap_or_else(|| DEFAULT_RATES_BRANCH.to_string()),
            ),
        };
        Url::parse(&remote_url).map_err(|_| ConfigError::InvalidUrl {
            name: "RATES_URL",
            value: remote_url.clone(),
        })?;

        let control_url = get("CONTROL_URL").unwrap_or_else(|| DEFAULT_CONTROL_URL.to_string());
        Url::parse(&control_url).map_err(|_| ConfigError::InvalidUrl {
            name: "CONTROL_URL",
            value: control_url.clone(),
        })?;

        // 3. Transport knobs
        let fetch_timeout = parse_secs("FETCH_TIMEOUT_SECS", get("FETCH_TIMEOUT_SECS"))?;
        let trigger_timeout = parse_secs("TRIGGER_TIMEOUT_SECS", get("TRIGGER_TIMEOUT_SECS"))?;

        let enable_cbu_fallback = get("ENABLE_CBU_FALLBACK")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(AppConfig {
            environment,
            app_origin,
            remote_url,
            local_path: get("RATES_LOCAL_PATH").unwrap_or_else(|| DEFAULT_LOCAL_PATH.to_string()),
            control_url,
            fetch_timeout,
            trigger_timeout,
            enable_cbu_fallback,
            cbu_url: get("CBU_URL").unwrap_or_else(|| DEFAULT_CBU_URL.to_string()),
            refresh_cron: get("REFRESH_CRON").unwrap_or_else(|| DEFAULT_REFRESH_CRON.to_string()),
            scraper_program: get("SCRAPER_PROGRAM").unwrap_or_else(|| "python".to_string()),
            scraper_script: get("SCRAPER_SCRIPT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("scripts/scraper.py")),
            snapshot_output: get("SNAPSHOT_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public/rates.json")),
        })
    }

    /// Absolute URL of the bundled snapshot, relative to the front-end origin.
    pub fn bundled_url(&self) -> String {
        self.app_origin
            .join(&self.local_path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/{}", self.app_origin.as_str().trim_end_matches('/'), self.local_path))
    }
}

pub fn remote_snapshot_url(repo: &str, branch: &str) -> String {
    format!(
        "https://raw.githubusercontent.com/{}/{}/public/rates.json",
        repo.trim_matches('/'),
        branch
    )
}

fn parse_secs(name: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(|secs| Some(Duration::from_secs_f64(secs)))
            .ok_or(ConfigError::InvalidNumber { name, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_are_local_development() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.environment, Environment::LocalDev);
        assert_eq!(
            config.remote_url,
            "https://raw.githubusercontent.com/brklyn498/Neouzsusd/rates-data/public/rates.json"
        );
        assert_eq!(config.bundled_url(), "http://localhost:5173/rates.json");
        assert_eq!(config.control_url, DEFAULT_CONTROL_URL);
        assert!(config.fetch_timeout.is_none());
        assert!(!config.enable_cbu_fallback);
    }

    #[test]
    fn test_deployed_origin_and_repo() {
        let config = config_from(&[
            ("APP_ORIGIN", "https://someone.github.io/dashboard/"),
            ("RATES_REPO", "someone/dashboard"),
            ("RATES_BRANCH", "data"),
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Deployed);
        assert_eq!(config.bundled_url(), "https://someone.github.io/dashboard/rates.json");
        assert_eq!(
            config.remote_url,
            "https://raw.githubusercontent.com/someone/dashboard/data/public/rates.json"
        );
    }

    #[test]
    fn test_explicit_environment_wins() {
        let config = config_from(&[("RATES_ENV", "deployed")]).unwrap();
        assert_eq!(config.environment, Environment::Deployed);

        let err = config_from(&[("RATES_ENV", "staging")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvironment { .. }));
    }

    #[test]
    fn test_rates_url_override_and_timeouts() {
        let config = config_from(&[
            ("RATES_URL", "http://mirror.local/rates.json"),
            ("FETCH_TIMEOUT_SECS", "2.5"),
            ("ENABLE_CBU_FALLBACK", "yes"),
        ])
        .unwrap();

        assert_eq!(config.remote_url, "http://mirror.local/rates.json");
        assert_eq!(config.fetch_timeout, Some(Duration::from_millis(2500)));
        assert!(config.enable_cbu_fallback);

        let err = config_from(&[("TRIGGER_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }

    #[test]
    fn test_invalid_origin() {
        let err = config_from(&[("APP_ORIGIN", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "APP_ORIGIN", .. }));
    }
}
