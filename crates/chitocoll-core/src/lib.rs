//! # chitocoll
//!
//! Extraction, aggregation and analysis of molecular-dynamics reports describing
//! chitosan bound to collagen, across degrees of chitosan deacetylation (DD) and
//! collagen hydroxylation (HD).
//!
//! ## Architecture
//!
//! The library is split into three layers:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`StructureKey`, `Dataset`,
//!   `WideTable`), the report and filename formats, CSV/JSON export and the statistics
//!   used by the analysis workflows.
//!
//! - **[`engine`]: The Orchestration Layer.** Directory aggregation with per-file failure
//!   collection, case discovery, pooled scanning of many case directories and key joins
//!   across interaction types.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures: `extract` (scan, merge and
//!   export), `trend` (per-case DD trend plots with linear fits) and `predict` (train/test
//!   split and a least-squares baseline on the exported table).

pub mod core;
pub mod engine;
pub mod workflows;
