//! Aggregations over status and profiling captures.
//!
//! - [`SmbInfo`]: session, tree-connection and open-file totals and groupings
//! - [`ProfileInfo`]: per-operation counters, optionally per share and client

mod profile;
mod status;

pub use profile::{ProfileEntry, ProfileInfo, ProfileSection};
pub use status::SmbInfo;
