use anyhow::Result;
use clap::{Parser, Subcommand};

use duro_dash::cli::{self, Session};
use duro_dash::config;
use duro_dash::view::OutputFormat;

/// Values accepted by `--format`.
const FORMATS: [&str; 3] = ["table", "json", "csv"];

#[derive(Debug, Parser)]
#[command(name = "duro-dash")]
#[command(about = "Inspect and drive a duro refresh scheduler from the terminal")]
struct App {
    /// Dashboard base URL (overrides config and DURO_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the last-24h summary: tables, updates, load
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table", value_parser = FORMATS)]
        format: String,
    },
    /// Show jobs started inside a time window
    Jobs {
        /// Window start (Unix seconds, RFC 3339, or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        from: Option<String>,
        /// Window end (default: now)
        #[arg(long)]
        to: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table", value_parser = FORMATS)]
        format: String,
    },
    /// List tracked tables with their schedule and available actions
    Tables {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table", value_parser = FORMATS)]
        format: String,
    },
    /// Queue a table for refresh
    Update {
        /// Fully qualified table name, e.g. first.cities
        table: String,
        /// Refresh the table's whole dependency tree
        #[arg(long)]
        tree: bool,
    },
    /// Press a dashboard control by data-id and label, or by element id
    Press {
        /// Table name (with --label) or element id such as update-tree-first.cities
        target: String,
        /// Control label: "Update table", "Update tree", "Scheduled", ...
        #[arg(long)]
        label: Option<String>,
    },
    /// Format a number of seconds the way the dashboard does
    Format {
        /// Non-negative whole number
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Treat the value as minutes
        #[arg(long)]
        minutes: bool,
        /// Emit the literal {hours} placeholder in the days branch
        #[arg(long)]
        legacy: bool,
    },
    /// Describe a Unix timestamp relative to now
    Ago {
        #[arg(allow_hyphen_values = true)]
        timestamp: String,
    },
    /// Check config files, server reachability, and the request log
    Health,
    /// Show recent requests from the request log
    Log {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.duro/dashboard.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value using a dotted key, e.g. server.url
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let config = config::load();

    if !config.display.color {
        colored::control::set_override(false);
    }

    let url = app.url;
    let fmt = |format: &str| OutputFormat::from_str_opt(Some(format));

    match app.command {
        Commands::Stats { format } => cli::run_stats(&Session::new(config, url), fmt(&format)),
        Commands::Jobs { from, to, format } => cli::run_jobs(
            &Session::new(config, url),
            from.as_deref(),
            to.as_deref(),
            fmt(&format),
        ),
        Commands::Tables { format } => cli::run_tables(&Session::new(config, url), fmt(&format)),
        Commands::Update { table, tree } => {
            cli::run_update(&Session::new(config, url), &table, tree)
        }
        Commands::Press { target, label } => {
            cli::run_press(&Session::new(config, url), &target, label.as_deref())
        }
        Commands::Format {
            value,
            minutes,
            legacy,
        } => cli::run_format(
            &value,
            minutes,
            legacy || config.display.legacy_hour_placeholder,
        ),
        Commands::Ago { timestamp } => cli::run_ago(&timestamp),
        Commands::Health => cli::run_health(&Session::new(config, url)),
        Commands::Log { limit } => cli::run_log(&config, limit),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_accepts_known_values() {
        for format in FORMATS {
            let app = App::try_parse_from(["duro-dash", "tables", "--format", format]).unwrap();
            assert!(matches!(app.command, Commands::Tables { .. }));
        }
    }

    #[test]
    fn format_flag_rejects_typos() {
        let err = App::try_parse_from(["duro-dash", "tables", "--format", "jsno"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        assert!(App::try_parse_from(["duro-dash", "stats", "--format", "xml"]).is_err());
    }

    #[test]
    fn global_url_and_format_default() {
        let app = App::try_parse_from(["duro-dash", "jobs", "--url", "http://duro:1"]).unwrap();
        assert_eq!(app.url.as_deref(), Some("http://duro:1"));
        match app.command {
            Commands::Jobs { format, from, to } => {
                assert_eq!(format, "table");
                assert!(from.is_none() && to.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
