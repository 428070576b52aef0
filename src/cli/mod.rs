//! CLI command implementations for duro-dash.
//!
//! Provides subcommand handlers for:
//! - `duro-dash stats`: 24h activity summary
//! - `duro-dash jobs`: jobs in a time window, drawn as spans
//! - `duro-dash tables`: tracked tables with schedule state and actions
//! - `duro-dash update` / `press`: queue a table or tree refresh
//! - `duro-dash format` / `ago`: run the formatters on a single value
//! - `duro-dash health` / `log`: connectivity and request history
//! - `duro-dash config show|init|set|reset`: configuration management

use anyhow::{Context as _, Result};
use chrono::Utc;
use colored::Colorize;

use crate::api::{DashboardClient, Stats, UpdateMode, UpdateOutcome};
use crate::config::{self, DashConfig};
use crate::dispatch::{
    ActionDispatcher, Control, ControlLabel, Dispatch, UpdateAction, apply_outcome,
};
use crate::format::relative::{format_relative, format_timestamp, parse_time};
use crate::format::{DurationFormatter, parse_seconds};
use crate::logging::{self, RequestLog};
use crate::view::jobs::JobWindow;
use crate::view::tables::TableRow;
use crate::view::{self, OutputFormat};

/// Everything a command needs: resolved config, client, formatter.
#[derive(Debug)]
pub struct Session {
    pub config: DashConfig,
    pub client: DashboardClient,
    pub formatter: DurationFormatter,
}

impl Session {
    /// Build a session, optionally pointing at a different server.
    pub fn new(mut config: DashConfig, url: Option<String>) -> Self {
        if let Some(url) = url {
            config.server.url = url;
        }
        let client = DashboardClient::from_config(&config.server)
            .with_log(RequestLog::from_config(&config.logging));
        let formatter = DurationFormatter::with_hour_placeholder(config.display.legacy_hour_placeholder);
        Self {
            config,
            client,
            formatter,
        }
    }
}

// ---------------------------------------------------------------------------
// duro-dash stats
// ---------------------------------------------------------------------------

/// Show the 24h activity summary.
pub fn run_stats(session: &Session, format: OutputFormat) -> Result<()> {
    let stats = session.client.stats().context("failed to load stats")?;

    match format {
        OutputFormat::Json => println!("{}", view::stats::render_json(&stats)?),
        OutputFormat::Csv => print!("{}", view::stats::render_csv(&stats)),
        OutputFormat::Table => print!("{}", view::stats::render_table(&stats)),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// duro-dash jobs
// ---------------------------------------------------------------------------

/// Show jobs started inside `[from, to]` (default: the configured look-back).
pub fn run_jobs(
    session: &Session,
    from: Option<&str>,
    to: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let now = Utc::now();
    let to = match to {
        Some(text) => parse_time(text).context("invalid --to")?,
        None => now,
    };
    let window = match from {
        Some(text) => JobWindow::new(parse_time(text).context("invalid --from")?, to)?,
        None => JobWindow::last_minutes(to, session.config.display.jobs_window_minutes)?,
    };

    let jobs = session
        .client
        .jobs(window.from, window.to)
        .context("failed to load jobs")?;

    let width = session.config.display.chart_width;
    let rows = view::jobs::build_rows(&jobs, &window, now, &session.formatter, width)?;

    match format {
        OutputFormat::Json => println!("{}", view::jobs::render_json(&rows)?),
        OutputFormat::Csv => print!("{}", view::jobs::render_csv(&rows)),
        OutputFormat::Table => print!("{}", view::jobs::render_table(&rows, &window, width)),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// duro-dash tables
// ---------------------------------------------------------------------------

/// Show every tracked table, newest refresh first.
pub fn run_tables(session: &Session, format: OutputFormat) -> Result<()> {
    let mut entries = session.client.tables().context("failed to load tables")?;

    view::tables::sort_by_last_created(&mut entries);
    let rows = view::tables::build_rows(&entries, &session.formatter, Utc::now())?;

    // Stats line sits above the table, as on the web page. A stats failure
    // is already reported by the request log.
    let stats = match format {
        OutputFormat::Table if !rows.is_empty() => session.client.stats().ok(),
        _ => None,
    };

    print!("{}", tables_output(&rows, format, stats.as_ref())?);
    Ok(())
}

/// Render the tables page. JSON and CSV stay machine-readable when empty.
fn tables_output(
    rows: &[TableRow],
    format: OutputFormat,
    stats: Option<&Stats>,
) -> Result<String> {
    let out = match format {
        OutputFormat::Json => format!("{}\n", view::tables::render_json(rows)?),
        OutputFormat::Csv => view::tables::render_csv(rows),
        OutputFormat::Table if rows.is_empty() => {
            format!("{}\n", "No tables tracked yet.".yellow())
        }
        OutputFormat::Table => {
            let mut out = String::new();
            if let Some(stats) = stats {
                out.push_str(&format!("{}\n\n", view::stats::summary_line(stats).dimmed()));
            }
            out.push_str(&view::tables::render_table(rows));
            out
        }
    };
    Ok(out)
}

// ---------------------------------------------------------------------------
// duro-dash update / press
// ---------------------------------------------------------------------------

/// Queue `table` (or its whole tree) for refresh.
pub fn run_update(session: &Session, table: &str, tree: bool) -> Result<()> {
    let label = if tree {
        ControlLabel::UpdateTree
    } else {
        ControlLabel::UpdateTable
    };
    press_controls(session, &mut [Control::new(table, label, false)])
}

/// Press a control identified by its `data-id` and label, or by a legacy
/// element id such as `update-tree-first.cities`.
pub fn run_press(session: &Session, target: &str, label: Option<&str>) -> Result<()> {
    let control = match label {
        Some(text) => {
            let label = ControlLabel::parse(text)
                .with_context(|| format!("unknown control label '{text}'"))?;
            let disabled = matches!(label, ControlLabel::Running | ControlLabel::Removed);
            Control::new(target, label, disabled)
        }
        None => {
            let action = UpdateAction::from_element_id(target).with_context(|| {
                format!("'{target}' is not an update control id (update-tree-<table> or update-table-<table>)")
            })?;
            let label = match action.mode {
                UpdateMode::Tree => ControlLabel::UpdateTree,
                UpdateMode::Table => ControlLabel::UpdateTable,
            };
            Control::new(action.table, label, false)
        }
    };

    press_controls(session, &mut [control])
}

/// Press the first control and relabel all of them from the outcome.
fn press_controls(session: &Session, controls: &mut [Control]) -> Result<()> {
    let Some(pressed) = controls.first() else {
        return Ok(());
    };
    let before = pressed.label;
    let dispatcher = ActionDispatcher::new(&session.client);

    match dispatcher.press(pressed)? {
        Dispatch::Ignored => {
            println!("{}", format!("'{before}' is disabled; nothing sent.").dimmed());
            Ok(())
        }
        Dispatch::Sent {
            action,
            outcome: outcome @ UpdateOutcome::Scheduled { .. },
        } => {
            apply_outcome(controls, &outcome);
            let after = controls.first().map_or(before, |c| c.label);
            println!(
                "{} {} ({} update): {} → {}",
                "✓".green().bold(),
                action.table.bold(),
                action.mode,
                before,
                after.as_str().blue()
            );
            Ok(())
        }
        Dispatch::Sent {
            action,
            outcome: UpdateOutcome::Rejected { message },
        } => {
            anyhow::bail!("{} was not scheduled: {message}", action.table)
        }
    }
}

// ---------------------------------------------------------------------------
// duro-dash format / ago
// ---------------------------------------------------------------------------

/// Format a single value of seconds (or minutes).
pub fn run_format(value: &str, minutes: bool, legacy: bool) -> Result<()> {
    let formatter = DurationFormatter::with_hour_placeholder(legacy);
    let amount = parse_seconds(value)?;
    let label = if minutes {
        formatter.format_minutes(amount)?
    } else {
        formatter.format(amount)
    };
    // Quoted so that the trailing space is visible.
    println!("{label:?}");
    Ok(())
}

/// Describe a Unix timestamp relative to now.
pub fn run_ago(timestamp: &str) -> Result<()> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .with_context(|| format!("not a Unix timestamp: '{timestamp}'"))?;
    println!("{} ({})", format_relative(ts)?, format_timestamp(ts)?.dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// duro-dash health
// ---------------------------------------------------------------------------

/// Check config files, server reachability, and the request log.
pub fn run_health(session: &Session) -> Result<()> {
    println!("{}", "duro-dash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.duro/dashboard.toml found"
        } else {
            "not found (run `duro-dash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".duro.toml found"
        } else {
            "none (optional)"
        },
    );

    let server_ok = session.client.is_healthy();
    print_health_item(
        "Server",
        server_ok,
        &if server_ok {
            format!("reachable at {}", session.client.base_url())
        } else {
            format!("not reachable at {}", session.client.base_url())
        },
    );

    print_health_item(
        "Hour labels",
        true,
        if session.formatter.is_legacy() {
            "legacy ({hours} placeholder)"
        } else {
            "interpolated"
        },
    );

    let log = RequestLog::from_config(&session.config.logging);
    match log.path() {
        Some(path) => {
            let entries = logging::read_entries(path);
            let failures = entries.iter().filter(|e| !e.success).count();
            print_health_item(
                "Request log",
                path.exists(),
                &format!("{} entries, {} failed", entries.len(), failures),
            );
        }
        None => print_health_item("Request log", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<18} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// duro-dash log
// ---------------------------------------------------------------------------

/// Print the most recent request log entries.
pub fn run_log(config: &DashConfig, limit: usize) -> Result<()> {
    let log = RequestLog::from_config(&config.logging);
    let path = log
        .path()
        .context("request logging is disabled (logging.enabled = false)")?;

    let entries = logging::read_recent(path, limit);
    if entries.is_empty() {
        println!("{}", "No requests logged yet.".yellow());
        return Ok(());
    }

    for entry in entries {
        let status = entry
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "---".to_string());
        let line = format!(
            "  {:<25} {:<4} {:<12} {:>3} {:>6}ms",
            entry.timestamp, entry.method, entry.endpoint, status, entry.latency_ms
        );
        if entry.success {
            println!("{line}");
        } else {
            println!(
                "{} {}",
                line.red(),
                entry.error.as_deref().unwrap_or_default().dimmed()
            );
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// duro-dash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective duro-dash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (label, exists) in [
        (
            "~/.duro/dashboard.toml",
            config::global_config_file().is_some_and(|p| p.exists()),
        ),
        (
            ".duro.toml",
            config::project_config_file().is_some_and(|p| p.exists()),
        ),
    ] {
        if exists {
            println!("  {} {}", "✓".green(), label.dimmed());
        } else {
            println!("  {} {} (not found)", "·".dimmed(), label.dimmed());
        }
    }
    println!("  {} {}", "·".dimmed(), "DURO_* environment variables".dimmed());

    Ok(())
}

/// Initialize a default config file at `~/.duro/dashboard.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}
