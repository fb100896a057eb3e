use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Schema error in table '{table}': missing required columns: {missing:?}")]
    Schema {
        table: String,
        missing: Vec<String>,
    },

    #[error("Parse error in table '{table}': {message}")]
    Parse { table: String, message: String },

    #[error("Aggregation '{table}' failed: {message}")]
    Aggregation { table: String, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
