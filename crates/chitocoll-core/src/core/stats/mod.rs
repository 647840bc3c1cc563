//! Descriptive statistics and least-squares fits used by the trend and
//! prediction workflows.

pub mod descriptive;
pub mod regression;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("Cannot compute statistics of an empty sample")]
    EmptySample,
    #[error("Sample lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },
    #[error("Fit needs at least two distinct x values")]
    DegenerateFit,
    #[error("Design matrix has {rows} rows but {columns} coefficients are required")]
    Underdetermined { rows: usize, columns: usize },
    #[error("Least-squares solve failed: {0}")]
    Solve(String),
}
