use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{DeskError, DeskResult};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON helpers over the real backend's REST surface.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> DeskResult<Self> {
        let base_url = normalize_base_url(base_url);
        if base_url.is_empty() {
            return Err(DeskError::invalid_input("baseUrl", "must not be empty"));
        }
        let http = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::unavailable(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> DeskResult<T> {
        let resp = self.send(self.http.get(self.url(path)), path)?;
        decode(resp, path)
    }

    pub fn post<B, T>(&self, path: &str, body: &B) -> DeskResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send(self.http.post(self.url(path)).json(body), path)?;
        decode(resp, path)
    }

    /// POST whose response body is irrelevant.
    pub fn post_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> DeskResult<()> {
        self.send(self.http.post(self.url(path)).json(body), path)?;
        Ok(())
    }

    pub fn put<B, T>(&self, path: &str, body: &B) -> DeskResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send(self.http.put(self.url(path)).json(body), path)?;
        decode(resp, path)
    }

    pub fn delete(&self, path: &str) -> DeskResult<()> {
        self.send(self.http.delete(self.url(path)), path)?;
        Ok(())
    }

    fn send(&self, builder: RequestBuilder, path: &str) -> DeskResult<Response> {
        let resp = builder
            .header("Accept", "application/json")
            .send()
            .map_err(|e| DeskError::unavailable(e.to_string()))?;
        let status = resp.status();
        debug!(path, status = status.as_u16(), "backend response");
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(status_error(status, path, body))
    }
}

fn decode<T: DeserializeOwned>(resp: Response, path: &str) -> DeskResult<T> {
    resp.json::<T>()
        .map_err(|e| DeskError::unavailable(format!("unreadable response from {}: {}", path, e)))
}

fn status_error(status: StatusCode, path: &str, body: String) -> DeskError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DeskError::NotAuthenticated,
        StatusCode::NOT_FOUND => DeskError::NotFound {
            entity: "resource".into(),
            id: path.to_string(),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DeskError::invalid_input("body", body)
        }
        _ => DeskError::unavailable(format!("HTTP {} from {}", status.as_u16(), path)),
    }
}

/// Trims whitespace and trailing slashes so paths can be appended with `/`.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
