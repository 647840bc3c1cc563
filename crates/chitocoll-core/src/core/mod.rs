//! # Core Module
//!
//! Stateless building blocks of the pipeline: the data model of simulated
//! chitosan/collagen structures, the upstream report formats, the export formats
//! and the statistics applied to aggregated measurements.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Composite keys, case identifiers, interaction types, datasets
//! - **File I/O** ([`io`]) - Filename grammar, fixed-window report tables, CSV/JSON export
//! - **Statistics** ([`stats`]) - Means, standard errors, linear and multiple least-squares fits
//!
//! ## Report Format
//!
//! Every simulated structure produces one report per analysis, named after the five
//! integers that identify it: hydroxylation code (over 42), hydroxylation variant,
//! deacetylation code (per mille), deacetylation variant and chitosan position.
//! Reports are whitespace tables whose relevant window is fixed per interaction type
//! (see [`models::interaction::ReportLayout`]).

pub mod io;
pub mod models;
pub mod stats;
