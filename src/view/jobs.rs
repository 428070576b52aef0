//! The jobs page: refresh jobs inside a time window, drawn as spans.
//!
//! Each job becomes a bar from its start to its finish, positioned on a
//! shared axis covering the requested window. Running jobs extend to `now`.

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Utc};
use colored::Colorize;

use crate::api::Job;
use crate::format::relative::format_short_timestamp;
use crate::format::{DurationFormatter, FormatError};

use super::{csv_field, truncate};

/// Time range the jobs page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl JobWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if from >= to {
            bail!("job window must start before it ends ({from} >= {to})");
        }
        Ok(Self { from, to })
    }

    /// The last `minutes` minutes up to `now`.
    pub fn last_minutes(now: DateTime<Utc>, minutes: u32) -> Result<Self> {
        Self::new(now - Duration::minutes(i64::from(minutes)), now)
    }

    fn span_seconds(&self) -> i64 {
        (self.to - self.from).num_seconds().max(1)
    }
}

/// A fully formatted job row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub table: String,
    pub start: String,
    pub finish: String,
    pub duration: String,
    pub running: bool,
    /// Column range of the bar on the chart axis, end exclusive.
    pub span: (usize, usize),
}

/// Format jobs ordered by start time.
pub fn build_rows(
    jobs: &[Job],
    window: &JobWindow,
    now: DateTime<Utc>,
    formatter: &DurationFormatter,
    width: usize,
) -> Result<Vec<JobRow>, FormatError> {
    let mut sorted: Vec<&Job> = jobs.iter().collect();
    sorted.sort_by_key(|job| (job.start, job.table.clone()));

    sorted
        .into_iter()
        .map(|job| -> Result<JobRow, FormatError> {
            let end = job.finish.unwrap_or_else(|| now.timestamp()).max(job.start);
            Ok(JobRow {
                table: job.table.clone(),
                start: format_short_timestamp(job.start)?,
                finish: match job.finish {
                    Some(ts) => format_short_timestamp(ts)?,
                    None => String::new(),
                },
                duration: formatter.format_delta(job.start, end)?,
                running: job.is_running(),
                span: span(job.start, end, window, width),
            })
        })
        .collect()
}

/// Map `[start, end]` onto `width` columns of the window axis.
///
/// Always at least one column wide so that instant jobs stay visible.
pub fn span(start: i64, end: i64, window: &JobWindow, width: usize) -> (usize, usize) {
    if width == 0 {
        return (0, 0);
    }
    let origin = window.from.timestamp();
    let total = window.span_seconds();
    let column = |ts: i64| -> usize {
        let offset = (ts - origin).clamp(0, total);
        ((offset as f64 / total as f64) * width as f64).floor() as usize
    };

    let left = column(start).min(width - 1);
    let right = column(end).max(left + 1).min(width);
    (left, right)
}

fn bar(row: &JobRow, width: usize) -> String {
    let (left, right) = row.span;
    let fill = if row.running { '=' } else { '#' };
    let mut out = String::with_capacity(width);
    out.push_str(&" ".repeat(left));
    out.extend(std::iter::repeat_n(fill, right - left));
    out.push_str(&" ".repeat(width.saturating_sub(right)));
    out
}

pub fn render_table(rows: &[JobRow], window: &JobWindow, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!(
            "Jobs {} → {}",
            window.from.format("%Y-%m-%d %H:%M"),
            window.to.format("%Y-%m-%d %H:%M")
        )
        .bold()
        .cyan()
    ));

    if rows.is_empty() {
        out.push_str(&format!("  {}\n", "No jobs in this window.".yellow()));
        return out;
    }

    out.push_str(&format!(
        "  {:<28} {:>8} {:>8} {:>12}  |{}|\n",
        "Table",
        "Start",
        "Finish",
        "Duration",
        " ".repeat(width)
    ));
    out.push_str(&format!("  {}\n", "-".repeat(62 + width)));

    for row in rows {
        let finish = if row.running {
            "running".to_string()
        } else {
            row.finish.clone()
        };
        let text = format!(
            "  {:<28} {:>8} {:>8} {:>12}  ",
            truncate(&row.table, 28),
            row.start,
            finish,
            row.duration,
        );
        let chart = bar(row, width);
        let chart = if row.running {
            chart.yellow()
        } else {
            chart.green()
        };
        out.push_str(&format!("{text}|{chart}|\n"));
    }

    out
}

pub fn render_json(rows: &[JobRow]) -> Result<String> {
    let values: Vec<_> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "table": row.table,
                "start": row.start,
                "finish": row.finish,
                "duration": row.duration,
                "running": row.running,
            })
        })
        .collect();

    Ok(serde_json::to_string_pretty(&values)?)
}

pub fn render_csv(rows: &[JobRow]) -> String {
    let mut out = String::from("table,start,finish,duration,running\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&row.table),
            row.start,
            row.finish,
            csv_field(&row.duration),
            row.running,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }

    fn window() -> JobWindow {
        JobWindow::last_minutes(now(), 100).unwrap()
    }

    fn job(table: &str, start: i64, finish: Option<i64>) -> Job {
        Job {
            table: table.to_string(),
            start,
            finish,
        }
    }

    #[test]
    fn window_must_be_ordered() {
        assert!(JobWindow::new(now(), now()).is_err());
        assert!(JobWindow::new(now(), now() - Duration::seconds(1)).is_err());
        let w = window();
        assert_eq!((w.to - w.from).num_minutes(), 100);
    }

    #[test]
    fn span_maps_onto_axis() {
        let w = window();
        let from = w.from.timestamp();
        // 100 minutes over 100 columns: one column per minute.
        assert_eq!(span(from, from + 600, &w, 100), (0, 10));
        assert_eq!(span(from + 3000, from + 3600, &w, 100), (50, 60));
        assert_eq!(span(from + 30, from + 30, &w, 100), (0, 1));
    }

    #[test]
    fn span_clamps_outside_window() {
        let w = window();
        let from = w.from.timestamp();
        assert_eq!(span(from - 600, from + 60, &w, 100), (0, 1));
        assert_eq!(span(NOW + 60, NOW + 600, &w, 100), (99, 100));
        assert_eq!(span(from, from + 60, &w, 0), (0, 0));
    }

    #[test]
    fn rows_sorted_and_formatted() {
        let w = window();
        let jobs = vec![
            job("b.second", NOW - 1200, Some(NOW - 1110)),
            job("a.first", NOW - 3000, Some(NOW - 2880)),
            job("c.running", NOW - 300, None),
        ];
        let rows = build_rows(&jobs, &w, now(), &DurationFormatter::new(), 50).unwrap();

        let names: Vec<_> = rows.iter().map(|r| r.table.as_str()).collect();
        assert_eq!(names, ["a.first", "b.second", "c.running"]);
        assert_eq!(rows[0].duration, "2m ");
        assert_eq!(rows[1].duration, "1m 30s");
        assert_eq!(rows[2].duration, "5m ");
        assert!(rows[2].running);
        assert_eq!(rows[2].finish, "");
        assert_eq!(rows[2].span.1, 50);
    }

    #[test]
    fn finish_before_start_renders_empty_duration() {
        let w = window();
        let rows = build_rows(
            &[job("x.y", NOW - 60, Some(NOW - 120))],
            &w,
            now(),
            &DurationFormatter::new(),
            10,
        )
        .unwrap();
        assert_eq!(rows[0].duration, "");
    }

    #[test]
    fn rendered_chart_contains_bars() {
        let w = window();
        let rows = build_rows(
            &[
                job("a.done", NOW - 3000, Some(NOW - 2400)),
                job("b.live", NOW - 600, None),
            ],
            &w,
            now(),
            &DurationFormatter::new(),
            20,
        )
        .unwrap();

        let text = render_table(&rows, &w, 20);
        assert!(text.contains("a.done"));
        assert!(text.contains("running"));
        assert!(text.contains('#'));
        assert!(text.contains('='));
    }

    #[test]
    fn empty_window_message() {
        let text = render_table(&[], &window(), 20);
        assert!(text.contains("No jobs in this window."));
    }

    #[test]
    fn csv_output() {
        let rows = build_rows(
            &[job("a.b", NOW - 90, Some(NOW))],
            &window(),
            now(),
            &DurationFormatter::new(),
            10,
        )
        .unwrap();
        let csv = render_csv(&rows);
        assert!(csv.starts_with("table,start,finish,duration,running\n"));
        assert!(csv.contains(",1m 30s,false"));
    }
}
