//! Error type for the metrics exporter.

use smbmetrics_core::collector::CollectError;

#[derive(Debug)]
pub enum ExporterError {
    /// Metric registration or encoding failed.
    Metrics(prometheus::Error),
    /// Encoded output was not valid UTF-8.
    Encoding(String),
    /// `smbstatus` unavailable at startup.
    Collect(CollectError),
    Io(std::io::Error),
}

impl std::fmt::Display for ExporterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExporterError::Metrics(e) => write!(f, "metrics error: {}", e),
            ExporterError::Encoding(msg) => write!(f, "encoding error: {}", msg),
            ExporterError::Collect(e) => write!(f, "smbstatus error: {}", e),
            ExporterError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExporterError {}

impl From<prometheus::Error> for ExporterError {
    fn from(e: prometheus::Error) -> Self {
        ExporterError::Metrics(e)
    }
}

impl From<CollectError> for ExporterError {
    fn from(e: CollectError) -> Self {
        ExporterError::Collect(e)
    }
}

impl From<std::io::Error> for ExporterError {
    fn from(e: std::io::Error) -> Self {
        ExporterError::Io(e)
    }
}
