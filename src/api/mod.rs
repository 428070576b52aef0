//! HTTP client for the duro server's dashboard endpoints.
//!
//! Talks to the server with the synchronous `ureq` client. Every call
//! returns an explicit `Result` and is recorded in the request log:
//!
//! - `GET /api/stats`: activity summary for the last 24 hours
//! - `GET /api/jobs?from=&to=`: jobs started inside a time window
//! - `GET /api/tables`: every tracked table with its schedule state
//! - `POST /update`: queue a table (or its tree) for refresh

pub mod types;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::logging::{self, RequestLog};

pub use types::{Job, Stats, TableEntry, UpdateMode, UpdateOutcome, UpdateResponse};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by [`DashboardClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The response body did not match the expected shape.
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The table name cannot be sent to the server.
    #[error("invalid table name: {0:?}")]
    InvalidTable(String),
}

impl ApiError {
    fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous client for one duro server.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    base_url: String,
    agent: ureq::Agent,
    log: RequestLog,
}

impl DashboardClient {
    /// Client for `base_url` with the given timeout and no request log file.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            log: RequestLog::disabled(),
        }
    }

    /// Build a client from the resolved `[server]` section.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.url, Duration::from_millis(config.timeout_ms))
    }

    /// Attach a request log.
    pub fn with_log(mut self, log: RequestLog) -> Self {
        self.log = log;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/stats`.
    pub fn stats(&self) -> Result<Stats, ApiError> {
        self.get_json("/api/stats", &[])
    }

    /// `GET /api/jobs` for jobs started between `from` and `to`.
    pub fn jobs(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Job>, ApiError> {
        let from = from.to_rfc3339();
        let to = to.to_rfc3339();
        self.get_json("/api/jobs", &[("from", &from), ("to", &to)])
    }

    /// `GET /api/tables`.
    pub fn tables(&self) -> Result<Vec<TableEntry>, ApiError> {
        self.get_json("/api/tables", &[])
    }

    /// `POST /update` with `table` and the tree flag.
    pub fn request_update(&self, table: &str, mode: UpdateMode) -> Result<UpdateOutcome, ApiError> {
        validate_table_name(table)?;

        let endpoint = "/update";
        let started = Instant::now();
        let result = self
            .agent
            .post(&self.url(endpoint))
            .send_form(&[("table", table), ("tree", mode.form_value())])
            .map_err(|e| from_ureq(endpoint, e))
            .and_then(|resp| {
                let status = resp.status();
                decode::<UpdateResponse>(endpoint, resp).map(|body| (status, body))
            });

        self.finish("POST", endpoint, started, result)
            .map(UpdateOutcome::from)
    }

    /// Whether the server answers `/api/stats`.
    pub fn is_healthy(&self) -> bool {
        self.stats().is_ok()
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let mut request = self.agent.get(&self.url(endpoint));
        for (key, value) in query {
            request = request.query(key, value);
        }

        let result = request
            .call()
            .map_err(|e| from_ureq(endpoint, e))
            .and_then(|resp| {
                let status = resp.status();
                decode::<T>(endpoint, resp).map(|body| (status, body))
            });

        self.finish("GET", endpoint, started, result)
    }

    /// Record the outcome of a request and strip the status code.
    fn finish<T>(
        &self,
        method: &str,
        endpoint: &str,
        started: Instant,
        result: Result<(u16, T), ApiError>,
    ) -> Result<T, ApiError> {
        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok((status, body)) => {
                self.log
                    .record(&logging::entry(method, endpoint, Some(status), latency_ms, None));
                Ok(body)
            }
            Err(err) => {
                self.log.record(&logging::entry(
                    method,
                    endpoint,
                    err.status(),
                    latency_ms,
                    Some(err.to_string()),
                ));
                Err(err)
            }
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, resp: ureq::Response) -> Result<T, ApiError> {
    resp.into_json::<T>().map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

fn from_ureq(endpoint: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, resp) => ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: t.to_string(),
        },
    }
}

/// Reject names the server could never match: empty or containing whitespace.
pub fn validate_table_name(table: &str) -> Result<(), ApiError> {
    if table.is_empty() || table.chars().any(char::is_whitespace) {
        return Err(ApiError::InvalidTable(table.to_string()));
    }
    Ok(())
}
