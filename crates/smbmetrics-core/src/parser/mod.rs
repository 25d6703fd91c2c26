//! Parsers for `smbstatus` output.
//!
//! These are pure functions over the command's standard output, designed to
//! be tested with string inputs:
//!
//! - [`text`]: legacy column-aligned tables (`-S`, `-p`, `-L`)
//! - [`json`]: `--json` documents for status and profiling captures

pub mod json;
pub mod text;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::new(format!(
            "invalid JSON at line {} column {}: {}",
            err.line(),
            err.column(),
            err
        ))
    }
}
