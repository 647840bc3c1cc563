//! # Workflows Module
//!
//! Top-level entry points of the pipeline. Each workflow takes a validated
//! configuration and a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and returns a summary of what it produced.
//!
//! - **Extraction** ([`extract`]) - Scan every case for each interaction type, export the
//!   per-interaction JSON files and the merged CSV table
//! - **Trend Plots** ([`trend`]) - One series per case of an interaction total against DD,
//!   with error bars and a fitted line
//! - **Prediction** ([`predict`]) - Seeded train/test split of the exported table and a
//!   least-squares baseline for the binding energy

pub mod extract;
pub mod predict;
pub mod trend;
