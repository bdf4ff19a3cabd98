// Settings file and logging setup.
//
// Settings live in a JSON file. Every field has a default, so a partial file
// (or none at all) is fine.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::ReportOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file
    pub database: String,
    /// User the CLI acts as when `--user` is not given
    pub default_user: String,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Months covered by the trend report
    pub trend_months: usize,
    /// Last-resort dashboard window, in days
    pub fallback_window_days: i64,
    /// Budgets used above this percentage raise an alert
    pub alert_threshold_pct: f64,
    /// How many categories the "top" report lists
    pub top_categories: usize,
    /// Days covered by the "top" report
    pub top_categories_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        let report = ReportOptions::default();
        Self {
            database: "budgetwise.db".to_string(),
            default_user: "default".to_string(),
            log_filter: "budgetwise=info".to_string(),
            trend_months: report.trend_months,
            fallback_window_days: report.fallback_window_days,
            alert_threshold_pct: report.alert_threshold_pct,
            top_categories: report.top_categories,
            top_categories_days: report.top_categories_days,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults when there is no file there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file {}", path.display()))
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            trend_months: self.trend_months,
            fallback_window_days: self.fallback_window_days,
            alert_threshold_pct: self.alert_threshold_pct,
            top_categories: self.top_categories,
            top_categories_days: self.top_categories_days,
        }
    }
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Tests may have installed a subscriber already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
