use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{normalize_base_url, ApiClient, DEFAULT_HTTP_TIMEOUT};
use crate::error::{DeskError, DeskResult};
use crate::storage::{KeyValueStore, KEY_DATA_SOURCE_BASE_URL, KEY_DATA_SOURCE_MODE};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataMode {
    Mock,
    Real,
}

impl DataMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Some(Self::Mock),
            "real" => Some(Self::Real),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Real => "real",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Checking,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    pub mode: DataMode,
    pub base_url: String,
    pub connection_status: ConnectionStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Answers whether a backend is reachable.
pub trait HealthProbe {
    fn probe(&self, base_url: &str) -> bool;
}

/// `GET {base}/health` with a bounded timeout; any 2xx counts as alive.
pub struct HttpHealthProbe {
    http: Client,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> DeskResult<Self> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::unavailable(e.to_string()))?;
        Ok(Self { http })
    }
}

impl HealthProbe for HttpHealthProbe {
    fn probe(&self, base_url: &str) -> bool {
        let url = format!("{}/health", base_url);
        match self.http.get(&url).send() {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(%url, status = resp.status().as_u16(), "health check rejected");
                false
            }
            Err(e) => {
                warn!(%url, error = %e, "health check failed");
                false
            }
        }
    }
}

/// Ticket for one in-flight probe; see [`DataSourceSwitch::complete_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
}

/// Selects between fixtures and the live backend and tracks reachability.
///
/// Completions are ordered by generation: only the most recently started probe
/// may update the status, and changing mode or base URL invalidates every
/// probe in flight.
pub struct DataSourceSwitch {
    mode: DataMode,
    base_url: String,
    status: ConnectionStatus,
    last_checked_at: Option<DateTime<Utc>>,
    generation: u64,
    probe: Box<dyn HealthProbe>,
    http_timeout: Duration,
    /// Built once per base URL and shared by every backend call.
    client: Option<ApiClient>,
}

impl DataSourceSwitch {
    pub fn new(probe: Box<dyn HealthProbe>) -> Self {
        let mut s = Self {
            mode: DataMode::Mock,
            base_url: String::new(),
            status: ConnectionStatus::Disconnected,
            last_checked_at: None,
            generation: 0,
            probe,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            client: None,
        };
        s.mark_mock_connected();
        s
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self.client = None;
        self.refresh_client();
        self
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    /// True when calls should go to the network.
    pub fn uses_backend(&self) -> bool {
        self.mode == DataMode::Real && !self.base_url.is_empty()
    }

    /// Client for the configured backend, regardless of mode.
    pub fn client(&self) -> DeskResult<&ApiClient> {
        self.client
            .as_ref()
            .ok_or_else(|| DeskError::unavailable("no backend URL configured"))
    }

    pub fn config(&self) -> DataSourceConfig {
        DataSourceConfig {
            mode: self.mode,
            base_url: self.base_url.clone(),
            connection_status: self.status,
            last_checked_at: self.last_checked_at,
        }
    }

    /// Loads mode and base URL independently; either may be missing or
    /// unreadable after a partial write, and each falls back on its own.
    pub fn restore(&mut self, store: &dyn KeyValueStore) {
        self.mode = match store.get(KEY_DATA_SOURCE_MODE) {
            Ok(Some(raw)) => DataMode::parse(&raw).unwrap_or_else(|| {
                let e = DeskError::MalformedPersistedState {
                    key: KEY_DATA_SOURCE_MODE.into(),
                    message: format!("unknown mode {:?}", raw),
                };
                warn!(error = %e, "defaulting to mock mode");
                DataMode::Mock
            }),
            Ok(None) => DataMode::Mock,
            Err(e) => {
                warn!(error = %e, "could not read data source mode");
                DataMode::Mock
            }
        };
        self.base_url = match store.get(KEY_DATA_SOURCE_BASE_URL) {
            Ok(v) => v.map(|s| normalize_base_url(&s)).unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not read data source base url");
                String::new()
            }
        };
        self.refresh_client();
        self.generation += 1;
        self.status = ConnectionStatus::Disconnected;
        info!(mode = self.mode.as_str(), base_url = %self.base_url, "data source restored");
        match self.mode {
            DataMode::Mock => self.mark_mock_connected(),
            // Nothing has been checked against this backend yet.
            DataMode::Real => self.last_checked_at = None,
        }
    }

    pub fn set_mode(&mut self, store: &dyn KeyValueStore, mode: DataMode) -> DeskResult<bool> {
        store.set(KEY_DATA_SOURCE_MODE, mode.as_str())?;
        self.mode = mode;
        self.generation += 1;
        info!(mode = mode.as_str(), "data source mode changed");
        Ok(self.check_connection())
    }

    pub fn set_base_url(&mut self, store: &dyn KeyValueStore, url: &str) -> DeskResult<bool> {
        let url = normalize_base_url(url);
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DeskError::invalid_input(
                "baseUrl",
                "must start with http:// or https://",
            ));
        }
        store.set(KEY_DATA_SOURCE_BASE_URL, &url)?;
        self.base_url = url;
        self.refresh_client();
        self.generation += 1;
        info!(base_url = %self.base_url, "data source base url changed");
        Ok(self.check_connection())
    }

    /// Runs a liveness check. Mock mode never touches the network.
    pub fn check_connection(&mut self) -> bool {
        match self.mode {
            DataMode::Mock => {
                self.mark_mock_connected();
                true
            }
            DataMode::Real if self.base_url.is_empty() => {
                self.generation += 1;
                self.status = ConnectionStatus::Disconnected;
                self.last_checked_at = Some(Utc::now());
                false
            }
            DataMode::Real => {
                let ticket = self.begin_check();
                let reachable = self.probe.probe(&self.base_url);
                self.complete_check(ticket, reachable);
                reachable
            }
        }
    }

    pub fn begin_check(&mut self) -> CheckTicket {
        self.generation += 1;
        self.status = ConnectionStatus::Checking;
        CheckTicket {
            generation: self.generation,
        }
    }

    /// Records a probe result. Returns false when the result was superseded.
    pub fn complete_check(&mut self, ticket: CheckTicket, reachable: bool) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping superseded health result"
            );
            return false;
        }
        self.status = if reachable {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        self.last_checked_at = Some(Utc::now());
        true
    }

    fn refresh_client(&mut self) {
        if self.base_url.is_empty() {
            self.client = None;
            return;
        }
        if let Some(current) = &self.client {
            if current.base_url() == self.base_url {
                return;
            }
        }
        self.client = match ApiClient::new(&self.base_url, self.http_timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "could not build backend client");
                None
            }
        };
    }

    fn mark_mock_connected(&mut self) {
        self.generation += 1;
        self.status = ConnectionStatus::Connected;
        self.last_checked_at = Some(Utc::now());
    }
}
