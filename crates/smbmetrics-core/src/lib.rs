//! smbmetrics-core: `smbstatus` parsing and aggregation for smbmetrics.
//!
//! Provides:
//! - `collector`: locating and running `smbstatus`, JSON/text fallback
//! - `parser`: pure parsers for the text tables and JSON documents
//! - `model`: normalized status and profiling captures
//! - `aggregate`: derived totals, groupings and per-operation counters
//! - `versions`: build, package and pod identity used for labeling
//! - `util`: helper utilities

pub mod aggregate;
pub mod collector;
pub mod model;
pub mod parser;
pub mod util;
pub mod versions;
