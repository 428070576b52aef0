//! Configuration system for duro-dash.
//!
//! Layers, lowest precedence first:
//!
//! 1. **Built-in defaults**: [`schema::DashConfig::default()`]
//! 2. **User global config**: `~/.duro/dashboard.toml`
//! 3. **Project local config**: `.duro.toml` in the current directory
//! 4. **Environment variables**: `DURO_*` overrides
//!
//! A file layer replaces the previous one; unset keys in a file come back
//! as defaults through `serde(default)`.

pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> DashConfig {
    let mut config = DashConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file. Missing or malformed files yield `None`.
fn load_toml_file(path: Option<PathBuf>) -> Option<DashConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("[duro] ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".duro").join("dashboard.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".duro.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// - `DURO_URL`: server base URL
/// - `DURO_TIMEOUT_MS`: request timeout
/// - `DURO_LEGACY_HOURS`: `1`/`true` for the `{hours}` placeholder labels
/// - `DURO_LOG`: request log on/off
/// - `DURO_JOBS_WINDOW_MINUTES`: default jobs look-back
fn apply_env_overrides(config: &mut DashConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut DashConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("DURO_URL")
        && !val.is_empty()
    {
        config.server.url = val;
    }
    if let Some(val) = var("DURO_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Some(val) = var("DURO_LEGACY_HOURS") {
        config.display.legacy_hour_placeholder = is_truthy(&val);
    }
    if let Some(val) = var("DURO_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Some(val) = var("DURO_JOBS_WINDOW_MINUTES")
        && let Ok(minutes) = val.parse::<u32>()
    {
        config.display.jobs_window_minutes = minutes;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.duro/dashboard.toml`.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, DashConfig::default_toml()).context("failed to write config file")?;
    Ok(())
}

/// Set a single dotted key (e.g. `server.url`) in the global config file.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_value_in_file(&path, key, value)
}

fn set_value_in_file(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // The result must still deserialize, otherwise `load` would drop the file.
    let output = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<DashConfig>(&output)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (section, leaf) = key
        .rsplit_once('.')
        .with_context(|| format!("config key must be 'section.key', got '{key}'"))?;

    let mut current = root;
    for part in section.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("duro-dash-config-{}", std::process::id()));
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for val in ["1", "true", "TRUE", "yes", "on"] {
            assert!(is_truthy(val), "{val}");
        }
        for val in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(val), "{val}");
        }
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DURO_URL", "http://duro:9000"),
            ("DURO_TIMEOUT_MS", "250"),
            ("DURO_LEGACY_HOURS", "1"),
            ("DURO_LOG", "off"),
            ("DURO_JOBS_WINDOW_MINUTES", "120"),
        ]);
        let mut config = DashConfig::default();
        apply_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.url, "http://duro:9000");
        assert_eq!(config.server.timeout_ms, 250);
        assert!(config.display.legacy_hour_placeholder);
        assert!(!config.logging.enabled);
        assert_eq!(config.display.jobs_window_minutes, 120);
    }

    #[test]
    fn unparsable_env_values_are_ignored() {
        let mut config = DashConfig::default();
        apply_overrides(&mut config, |k| match k {
            "DURO_TIMEOUT_MS" => Some("soon".to_string()),
            "DURO_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.server.timeout_ms, 10_000);
        assert_eq!(config.server.url, "http://127.0.0.1:5000");
    }

    #[test]
    fn set_toml_value_by_type() {
        let mut root: toml::Value = toml::from_str(
            r#"
[server]
url = "http://a"
timeout_ms = 100

[display]
color = true
"#,
        )
        .unwrap();

        set_toml_value(&mut root, "server.url", "http://b").unwrap();
        set_toml_value(&mut root, "server.timeout_ms", "50").unwrap();
        set_toml_value(&mut root, "display.color", "false").unwrap();

        assert_eq!(root["server"]["url"].as_str(), Some("http://b"));
        assert_eq!(root["server"]["timeout_ms"].as_integer(), Some(50));
        assert_eq!(root["display"]["color"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root: toml::Value = toml::from_str("[server]\ntimeout_ms = 1\n").unwrap();
        assert!(set_toml_value(&mut root, "server.timeout_ms", "fast").is_err());
        assert!(set_toml_value(&mut root, "server.nope", "1").is_err());
        assert!(set_toml_value(&mut root, "nope.url", "x").is_err());
        assert!(set_toml_value(&mut root, "toplevel", "x").is_err());
    }

    #[test]
    fn init_then_set_in_file() {
        let path = temp_path("dashboard.toml");
        write_default_config(&path, false).unwrap();
        assert!(write_default_config(&path, false).is_err());
        write_default_config(&path, true).unwrap();

        set_value_in_file(&path, "display.legacy_hour_placeholder", "yes").unwrap();
        let config: DashConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(config.display.legacy_hour_placeholder);
    }

    #[test]
    fn set_creates_file_from_defaults() {
        let path = temp_path("fresh.toml");
        set_value_in_file(&path, "server.url", "http://fresh:1").unwrap();
        let config: DashConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.server.url, "http://fresh:1");
        assert_eq!(config.server.timeout_ms, 10_000);
    }

    #[test]
    fn show_effective_config_parses_back() {
        let toml_str = show_effective_config().unwrap();
        let _: DashConfig = toml::from_str(&toml_str).unwrap();
    }
}
