use super::config::ConfigError;
use crate::core::io::export::ExportError;
use crate::core::models::ids::CaseId;
use crate::core::stats::StatsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read directory '{path}': {source}", path = path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Case directory {case} not found under the input root")]
    CaseNotFound { case: CaseId },

    #[error("Column '{column}' appears in both joined tables")]
    ColumnCollision { column: String },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: ExportError,
    },

    #[error("Statistics failed: {source}")]
    Stats {
        #[from]
        source: StatsError,
    },

    #[error("{requested} series requested but the palette only has {available} colours")]
    TooManySeries { requested: usize, available: usize },

    #[error("Failed to render '{path}': {message}", path = path.display())]
    Render { path: PathBuf, message: String },

    #[error("Failed to read table '{path}': {source}", path = path.display())]
    TableRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Column '{0}' not found in input table")]
    MissingColumn(String),

    #[error("Cannot split {rows} rows with test fraction {fraction}")]
    InvalidSplit { rows: usize, fraction: f64 },

    #[error("No data: {0}")]
    NoData(String),

    #[error("Worker pool could not be created: {0}")]
    WorkerPool(String),
}
