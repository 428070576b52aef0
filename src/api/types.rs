//! Payloads exchanged with the duro server.

use serde::{Deserialize, Deserializer, Serialize};

/// `GET /api/stats`: activity over the last 24 hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub tables: u64,
    pub updates: u64,
    pub load: f64,
}

/// One entry of `GET /api/jobs`. `finish` is `None` while the job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub table: String,
    pub start: i64,
    #[serde(default)]
    pub finish: Option<i64>,
}

impl Job {
    pub fn is_running(&self) -> bool {
        self.finish.is_none()
    }
}

/// One entry of `GET /api/tables`.
///
/// `interval` is in minutes, `mean` in seconds, `last_created` in Unix
/// seconds. The state flags are absent on older servers and default to
/// `false`; `started` may also be sent as the start timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub table_name: String,
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub last_created: Option<i64>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default, deserialize_with = "truthy")]
    pub started: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub deleted: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub force: bool,
}

/// Response body of `POST /update`.
///
/// `table` is only present when the update was scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Whether an update refreshes a single table or the table and its dependents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateMode {
    #[default]
    Table,
    Tree,
}

impl UpdateMode {
    pub fn from_tree_flag(tree: bool) -> Self {
        if tree { Self::Tree } else { Self::Table }
    }

    /// Value of the `tree` form field.
    pub fn form_value(self) -> &'static str {
        match self {
            Self::Table => "0",
            Self::Tree => "1",
        }
    }
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// Outcome of an update request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The server queued the table for refresh.
    Scheduled { table: String },
    /// The server declined, e.g. because the table is already running.
    Rejected { message: String },
}

impl From<UpdateResponse> for UpdateOutcome {
    fn from(resp: UpdateResponse) -> Self {
        match resp.table {
            Some(table) => Self::Scheduled { table },
            None => Self::Rejected {
                message: resp
                    .message
                    .unwrap_or_else(|| "update was not scheduled".to_string()),
            },
        }
    }
}

/// Accept `true`/`false`, numbers (non-zero is true), strings, or `null`.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    })
}
