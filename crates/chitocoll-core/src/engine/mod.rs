//! # Engine Module
//!
//! Orchestration of the extraction pipeline: turning directories of report files into
//! datasets and combining datasets across cases and interaction types.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated run parameters built through builders
//! - **Directory Aggregation** ([`aggregate`]) - One record per report file, failures collected per file
//! - **Cross-Case Merging** ([`merge`]) - Case discovery, optionally pooled scans, key joins
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Errors that abort a run
//!
//! A malformed report never aborts a scan. It is recorded as a
//! [`aggregate::FileFailure`] and the remaining files are still processed; likewise an
//! unreadable case directory becomes a [`merge::CaseFailure`] while the other cases proceed.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod merge;
pub mod progress;
