use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Request log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the request log (`~/.duro/request-log.jsonl`).
///
/// One line per call to the duro server, successful or not. Read back by
/// `duro-dash log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub timestamp: String,
    pub method: String,
    pub endpoint: String,
    /// HTTP status, absent when the request never got a response.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    pub latency_ms: u64,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Log level controlling the stderr echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Parse a configured level, falling back to `Info` for unknown values.
    pub fn parse(val: &str) -> Self {
        match val.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Request logger built from the `[logging]` section.
///
/// Writes are best-effort: a log that cannot be written never fails the
/// request it describes.
#[derive(Debug, Clone)]
pub struct RequestLog {
    path: Option<PathBuf>,
    level: Level,
}

impl RequestLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            path: if config.enabled {
                expand_home(&config.path)
            } else {
                None
            },
            level: Level::parse(&config.level),
        }
    }

    /// Logger that writes to `path`.
    pub fn to_file(path: impl Into<PathBuf>, level: Level) -> Self {
        Self {
            path: Some(path.into()),
            level,
        }
    }

    /// Logger that only echoes failures to stderr.
    pub fn disabled() -> Self {
        Self {
            path: None,
            level: Level::Warn,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record a request and echo it to stderr according to the level.
    pub fn record(&self, entry: &RequestLogEntry) {
        if self.echoes(entry) {
            if entry.success {
                eprintln!(
                    "[duro] {} {} {} ({}ms)",
                    entry.method,
                    entry.endpoint,
                    entry.status.map(|s| s.to_string()).unwrap_or_default(),
                    entry.latency_ms
                );
            } else {
                eprintln!(
                    "[duro] {} {} failed: {}",
                    entry.method,
                    entry.endpoint,
                    entry.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        if let Some(path) = &self.path {
            let _ = append_entry(path, entry);
        }
    }

    /// Whether `entry` is at or above the configured level.
    fn echoes(&self, entry: &RequestLogEntry) -> bool {
        entry_level(entry) >= self.level
    }
}

/// Successes are debug, error statuses warn, and requests that produced
/// no status (transport or decode failures) error.
fn entry_level(entry: &RequestLogEntry) -> Level {
    match (entry.success, entry.status) {
        (true, _) => Level::Debug,
        (false, Some(_)) => Level::Warn,
        (false, None) => Level::Error,
    }
}

/// Build a log entry stamped with the current time.
pub fn entry(
    method: &str,
    endpoint: &str,
    status: Option<u16>,
    latency_ms: u64,
    error: Option<String>,
) -> RequestLogEntry {
    RequestLogEntry {
        timestamp: Utc::now().to_rfc3339(),
        method: method.to_string(),
        endpoint: endpoint.to_string(),
        status,
        latency_ms,
        success: error.is_none(),
        error,
    }
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all entries from a request log. Malformed lines are skipped; a
/// missing file yields an empty list.
pub fn read_entries(path: &Path) -> Vec<RequestLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<RequestLogEntry>(&line).ok())
        .collect()
}

/// The last `limit` entries, oldest first.
pub fn read_recent(path: &Path, limit: usize) -> Vec<RequestLogEntry> {
    let mut entries = read_entries(path);
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
    entries
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_entry(path: &Path, entry: &RequestLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("duro-dash-log-{}", std::process::id()));
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn level_parsing() {
        assert_eq!(Level::parse("debug"), Level::Debug);
        assert_eq!(Level::parse("WARN"), Level::Warn);
        assert_eq!(Level::parse("error"), Level::Error);
        assert_eq!(Level::parse("info"), Level::Info);
        assert_eq!(Level::parse("bogus"), Level::Info);
    }

    #[test]
    fn echo_respects_the_level() {
        let ok = entry("GET", "/api/stats", Some(200), 5, None);
        let status = entry("GET", "/api/stats", Some(500), 5, Some("HTTP 500".to_string()));
        let transport = entry("GET", "/api/stats", None, 5, Some("refused".to_string()));

        let echoed = |level| {
            let log = RequestLog {
                path: None,
                level,
            };
            [&ok, &status, &transport].map(|e| log.echoes(e))
        };

        assert_eq!(echoed(Level::Debug), [true, true, true]);
        assert_eq!(echoed(Level::Info), [false, true, true]);
        assert_eq!(echoed(Level::Warn), [false, true, true]);
        assert_eq!(echoed(Level::Error), [false, false, true]);
    }

    #[test]
    fn entries_round_through_the_file() {
        let path = temp_log("roundtrip.jsonl");
        let log = RequestLog::to_file(&path, Level::Error);

        log.record(&entry("GET", "/api/stats", Some(200), 12, None));
        log.record(&entry(
            "POST",
            "/update",
            None,
            3,
            Some("connection refused".to_string()),
        ));

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].success);
        assert_eq!(entries[0].status, Some(200));
        assert!(!entries[1].success);
        assert_eq!(entries[1].error.as_deref(), Some("connection refused"));

        let recent = read_recent(&path, 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].endpoint, "/update");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let path = temp_log("malformed.jsonl");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "not json\n{\"timestamp\":\"t\",\"method\":\"GET\",\"endpoint\":\"/api/jobs\",\"latency_ms\":1}\n",
        )
        .unwrap();

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].success);
    }

    #[test]
    fn missing_file_reads_empty() {
        let path = temp_log("does-not-exist.jsonl");
        assert!(read_entries(&path).is_empty());
    }

    #[test]
    fn disabled_config_has_no_path() {
        let config = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(RequestLog::from_config(&config).path().is_none());
    }

    #[test]
    fn home_expansion() {
        assert_eq!(expand_home("/tmp/x.jsonl"), Some(PathBuf::from("/tmp/x.jsonl")));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a/b"), Some(home.join("a/b")));
        }
    }
}
