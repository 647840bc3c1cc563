//! # Core Models Module
//!
//! Data structures describing the simulated chitosan/collagen structures and the
//! measurements reduced from their reports.
//!
//! ## Key Components
//!
//! - [`ids`] - Composite structure keys and hydroxylation case identifiers
//! - [`interaction`] - Interaction types, amino-acid categories and the report layout table
//! - [`dataset`] - Per-interaction datasets and the joined wide table

pub mod dataset;
pub mod ids;
pub mod interaction;
