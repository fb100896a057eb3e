use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Timestamp format the raw event logs are emitted in.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Path fragment that marks a pageview as a product-detail view.
pub const DEFAULT_PRODUCT_PATH_PATTERN: &str = "/product/";

/// Configuration for a single pipeline run.
///
/// Passed explicitly into the pipeline entry point so test runs are
/// deterministic and two runs never share ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the eight raw CSV files.
    pub raw_dir: PathBuf,

    /// Directory the seven aggregated CSV files are written to.
    pub out_dir: PathBuf,

    /// Only process events on or after this date. None = no lower bound.
    pub start_date: Option<NaiveDate>,

    /// Only process events on or before this date. None = no upper bound.
    pub end_date: Option<NaiveDate>,

    /// Reference date for recency scoring. None = today.
    pub reference_date: Option<NaiveDate>,

    /// chrono format string for raw timestamp columns.
    pub timestamp_format: String,

    /// Substring of a pageview path that counts as a product-detail view.
    pub product_path_pattern: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw_data"),
            out_dir: PathBuf::from("aggregated_data"),
            start_date: None,
            end_date: None,
            reference_date: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            product_path_pattern: DEFAULT_PRODUCT_PATH_PATTERN.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(PipelineError::Config(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }
        if self.timestamp_format.is_empty() {
            return Err(PipelineError::Config(
                "timestamp_format must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The date recency is measured against.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
