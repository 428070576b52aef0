//! The tables page: one row per tracked table with its schedule and controls.

use std::cmp::Reverse;

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::api::TableEntry;
use crate::dispatch::{Control, ControlLabel, controls_for};
use crate::format::relative::format_relative_to;
use crate::format::{DurationFormatter, FormatError, format_optional};

use super::{csv_field, truncate};

/// A fully formatted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub table: String,
    pub interval: String,
    pub last_created: String,
    pub mean: String,
    pub controls: [Control; 2],
}

impl TableRow {
    /// Labels of the enabled controls, i.e. the actions a user can take.
    pub fn actions(&self) -> Vec<ControlLabel> {
        let mut labels: Vec<ControlLabel> = Vec::new();
        for control in self.controls.iter().filter(|c| !c.disabled) {
            if !labels.contains(&control.label) {
                labels.push(control.label);
            }
        }
        labels
    }

    /// Single status word: the disabled label, or the first control's label.
    pub fn status(&self) -> ControlLabel {
        self.controls[0].label
    }
}

/// Most recently created first; tables never created go last.
pub fn sort_by_last_created(entries: &mut [TableEntry]) {
    entries.sort_by_key(|e| (e.last_created.is_none(), Reverse(e.last_created)));
}

/// Format every column of every entry, in the given order.
pub fn build_rows(
    entries: &[TableEntry],
    formatter: &DurationFormatter,
    now: DateTime<Utc>,
) -> Result<Vec<TableRow>, FormatError> {
    entries
        .iter()
        .map(|entry| -> Result<TableRow, FormatError> {
            Ok(TableRow {
                table: entry.table_name.clone(),
                interval: format_optional(entry.interval, |m| formatter.format_minutes(m))?,
                last_created: format_optional(entry.last_created, |ts| {
                    format_relative_to(ts, now)
                })?,
                mean: format_optional(entry.mean, |m| formatter.format_average(m))?,
                controls: controls_for(entry),
            })
        })
        .collect()
}

pub fn render_table(rows: &[TableRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Tables".bold().cyan()));
    out.push_str(&format!(
        "  {:<32} {:>14} {:>18} {:>14}  {}\n",
        "Table", "Interval", "Last created", "Mean", "Actions"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(96)));

    for (i, row) in rows.iter().enumerate() {
        let line = format!(
            "  {:<32} {:>14} {:>18} {:>14}  ",
            truncate(&row.table, 32),
            row.interval,
            row.last_created,
            row.mean,
        );
        let line = if i % 2 == 0 {
            line.normal()
        } else {
            line.dimmed()
        };
        out.push_str(&format!("{line}{}\n", render_actions(row)));
    }

    out
}

fn render_actions(row: &TableRow) -> String {
    let actions = row.actions();
    if actions.is_empty() {
        return colorize_label(row.status()).to_string();
    }
    actions
        .iter()
        .map(|label| format!("[{}]", colorize_label(*label)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn colorize_label(label: ControlLabel) -> colored::ColoredString {
    match label {
        ControlLabel::Running => label.as_str().yellow(),
        ControlLabel::Removed => label.as_str().red(),
        ControlLabel::Scheduled => label.as_str().blue(),
        ControlLabel::UpdateTable | ControlLabel::UpdateTree => label.as_str().green(),
    }
}

pub fn render_json(rows: &[TableRow]) -> Result<String> {
    let values: Vec<_> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "table": row.table,
                "interval": row.interval,
                "last_created": row.last_created,
                "mean": row.mean,
                "status": row.status().as_str(),
                "actions": row.actions().iter().map(|l| l.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();

    Ok(serde_json::to_string_pretty(&values)?)
}

pub fn render_csv(rows: &[TableRow]) -> String {
    let mut out = String::from("table,interval,last_created,mean,status\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&row.table),
            csv_field(&row.interval),
            csv_field(&row.last_created),
            csv_field(&row.mean),
            row.status(),
        ));
    }
    out
}
