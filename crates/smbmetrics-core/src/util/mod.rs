//! Utility modules for smbmetrics.

mod time_parser;

pub use time_parser::{TimeParseError, parse_time};
