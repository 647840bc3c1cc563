//! Provides input/output for the simulation report formats and the exported tables.
//!
//! Reading covers the report filename grammar ([`filename`]) and the fixed-window
//! report table ([`report`]); writing covers the CSV and JSON exports ([`export`]).
//! Both directions sit behind the traits in [`traits`].

pub mod export;
pub mod filename;
pub mod report;
pub mod traits;
