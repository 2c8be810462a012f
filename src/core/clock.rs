use chrono::Utc;
use reqwest::Url;
use std::sync::atomic::{AtomicU64, Ordering};

/// Query parameter carrying the cache-busting token.
pub const CACHE_BUST_PARAM: &str = "t";

/// Source of strictly increasing cache-busting tokens.
pub trait CacheBuster: Send + Sync {
    fn next_token(&self) -> u64;
}

/// Unix milliseconds, bumped past the previous token when the wall clock stalls.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBuster for SystemClock {
    fn next_token(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Deterministic tokens: `start`, `start + 1`, ...
#[derive(Debug)]
pub struct SequenceClock {
    next: AtomicU64,
}

impl SequenceClock {
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl CacheBuster for SequenceClock {
    fn next_token(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

/// Append `t=<token>` to `url`, keeping any query it already has.
pub fn with_cache_buster(url: &str, token: u64) -> anyhow::Result<Url> {
    let mut parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid source URL '{}': {}", url, e))?;
    parsed
        .query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &token.to_string());
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_strictly_increases() {
        let clock = SystemClock::new();
        let mut prev = clock.next_token();
        for _ in 0..1000 {
            let next = clock.next_token();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_sequence_clock() {
        let clock = SequenceClock::starting_at(1000);
        assert_eq!(clock.next_token(), 1000);
        assert_eq!(clock.next_token(), 1001);
    }

    #[test]
    fn test_with_cache_buster() {
        let url = with_cache_buster("http://localhost:5173/rates.json", 42).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5173/rates.json?t=42");

        let url = with_cache_buster("https://mirror.local/rates.json?ref=main", 7).unwrap();
        assert_eq!(url.as_str(), "https://mirror.local/rates.json?ref=main&t=7");

        assert!(with_cache_buster("rates.json", 1).is_err());
    }
}
