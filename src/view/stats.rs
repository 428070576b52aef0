use anyhow::Result;
use colored::Colorize;

use crate::api::Stats;

/// The one-line summary shown at the top of every page.
pub fn summary_line(stats: &Stats) -> String {
    format!(
        "Last 24h: {} tables, {} updates. Load: {}%.",
        stats.tables, stats.updates, stats.load
    )
}

pub fn render_table(stats: &Stats) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "duro overview".bold().cyan()));
    out.push_str(&format!("{}\n", "=".repeat(40)));
    out.push_str(&format!("  {}\n", summary_line(stats)));
    out
}

pub fn render_json(stats: &Stats) -> Result<String> {
    Ok(serde_json::to_string_pretty(stats)?)
}

pub fn render_csv(stats: &Stats) -> String {
    format!(
        "tables,updates,load\n{},{},{}\n",
        stats.tables, stats.updates, stats.load
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> Stats {
        Stats {
            tables: 12,
            updates: 40,
            load: 37.5,
        }
    }

    #[test]
    fn summary_matches_page_text() {
        assert_eq!(
            summary_line(&stats()),
            "Last 24h: 12 tables, 40 updates. Load: 37.5%."
        );
    }

    #[test]
    fn whole_load_has_no_decimals() {
        let s = Stats {
            load: 40.0,
            ..stats()
        };
        assert_eq!(summary_line(&s), "Last 24h: 12 tables, 40 updates. Load: 40%.");
    }

    #[test]
    fn table_contains_summary() {
        assert!(render_table(&stats()).contains("Last 24h: 12 tables"));
    }

    #[test]
    fn json_and_csv() {
        let json = render_json(&stats()).unwrap();
        let back: Stats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats());
        assert_eq!(render_csv(&stats()), "tables,updates,load\n12,40,37.5\n");
    }
}
