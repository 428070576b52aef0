/// Configuration schema and defaults for duro-dash.
///
/// Defines the TOML-serializable structure with three sections:
/// `[server]`, `[display]`, and `[logging]`. Every field has a built-in
/// default, so a config file only needs the values it overrides.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level duro-dash configuration.
///
/// Maps directly to `~/.duro/dashboard.toml` and `.duro.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub server: ServerConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Where the duro server lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the duro web server.
    pub url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Emit `"1d 1{hours}h "` like the deployed pages instead of `"1d 1h "`.
    pub legacy_hour_placeholder: bool,
    /// Default look-back for `duro-dash jobs` when `--from` is omitted.
    pub jobs_window_minutes: u32,
    /// Width of the span bars in the jobs chart.
    pub chart_width: usize,
    /// Colored terminal output.
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            legacy_hour_placeholder: false,
            jobs_window_minutes: 30,
            chart_width: 40,
            color: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Request log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether requests are appended to the log file.
    pub enabled: bool,
    /// Path to the request log. `~` is expanded to the home directory.
    pub path: String,
    /// `"debug"` also echoes successful requests to stderr.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.duro/request-log.jsonl".to_string(),
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl DashConfig {
    /// Annotated default config, written by `duro-dash config init`.
    pub fn default_toml() -> String {
        r#"# duro-dash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (DURO_*)
#   2. Project config (.duro.toml in current directory)
#   3. User global config (~/.duro/dashboard.toml)
#   4. Built-in defaults

[server]
url = "http://127.0.0.1:5000"
timeout_ms = 10000

[display]
legacy_hour_placeholder = false   # true: "1d 1{hours}h " as on the old pages
jobs_window_minutes = 30          # default look-back for `duro-dash jobs`
chart_width = 40
color = true

[logging]
enabled = true
path = "~/.duro/request-log.jsonl"
level = "info"                    # debug | info | warn | error
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DashConfig::default();
        assert_eq!(config.server.url, "http://127.0.0.1:5000");
        assert_eq!(config.server.timeout_ms, 10_000);
        assert!(!config.display.legacy_hour_placeholder);
        assert_eq!(config.display.jobs_window_minutes, 30);
        assert!(config.logging.enabled);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let toml_str = r#"
[server]
url = "http://duro:8000"

[display]
legacy_hour_placeholder = true
"#;
        let config: DashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.url, "http://duro:8000");
        assert_eq!(config.server.timeout_ms, 10_000);
        assert!(config.display.legacy_hour_placeholder);
        assert_eq!(config.display.chart_width, 40);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: DashConfig = toml::from_str("").unwrap();
        assert_eq!(config.display.jobs_window_minutes, 30);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: DashConfig = toml::from_str(&DashConfig::default_toml()).unwrap();
        let defaults = DashConfig::default();
        assert_eq!(config.server.url, defaults.server.url);
        assert_eq!(config.display.chart_width, defaults.display.chart_width);
        assert_eq!(config.logging.path, defaults.logging.path);
    }
}
