use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::api::DEFAULT_HTTP_TIMEOUT;
use crate::datasource::DEFAULT_PROBE_TIMEOUT;
use crate::list::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const ENV_WORKSPACE: &str = "SCHOOLDESK_WORKSPACE";
pub const ENV_PROBE_TIMEOUT_MS: &str = "SCHOOLDESK_PROBE_TIMEOUT_MS";
pub const ENV_HTTP_TIMEOUT_MS: &str = "SCHOOLDESK_HTTP_TIMEOUT_MS";
pub const ENV_MOCK_LATENCY_MS: &str = "SCHOOLDESK_MOCK_LATENCY_MS";
pub const ENV_PAGE_SIZE: &str = "SCHOOLDESK_PAGE_SIZE";
pub const ENV_LOG: &str = "SCHOOLDESK_LOG";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Opened at startup when set, as if `workspace.select` had been sent.
    pub workspace: Option<PathBuf>,
    pub probe_timeout: Duration,
    pub http_timeout: Duration,
    pub mock_latency: Duration,
    pub page_size: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            mock_latency: Duration::ZERO,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds a config from any variable source; invalid values keep the
    /// default and are reported.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            workspace: lookup(ENV_WORKSPACE)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            probe_timeout: parse_millis(&lookup, ENV_PROBE_TIMEOUT_MS, 100..=60_000)
                .unwrap_or(d.probe_timeout),
            http_timeout: parse_millis(&lookup, ENV_HTTP_TIMEOUT_MS, 100..=300_000)
                .unwrap_or(d.http_timeout),
            mock_latency: parse_millis(&lookup, ENV_MOCK_LATENCY_MS, 0..=10_000)
                .unwrap_or(d.mock_latency),
            page_size: parse_number(&lookup, ENV_PAGE_SIZE, 1..=MAX_PAGE_SIZE as u64)
                .map(|n| n as usize)
                .unwrap_or(d.page_size),
        }
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    range: std::ops::RangeInclusive<u64>,
) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(n) if range.contains(&n) => Some(n),
        _ => {
            warn!(
                key,
                value = %raw,
                "ignoring out-of-range setting (allowed {}..={})",
                range.start(),
                range.end()
            );
            None
        }
    }
}

fn parse_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    range: std::ops::RangeInclusive<u64>,
) -> Option<Duration> {
    parse_number(lookup, key, range).map(Duration::from_millis)
}
