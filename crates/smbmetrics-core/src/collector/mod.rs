//! `smbstatus` invocation and capture collection.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                  SmbStatusCollector                   │
//! │   version / shares / sessions / locks / status /      │
//! │   profile  (JSON first, text table fallback)          │
//! └──────────────────────────┬────────────────────────────┘
//!                            │
//!                    ┌───────▼───────┐
//!                    │ StatusCommand │ (trait)
//!                    └───────┬───────┘
//!              ┌─────────────┴─────────────┐
//!       ┌──────▼──────────┐        ┌───────▼───────┐
//!       │ SmbStatusCommand│        │ MockSmbStatus │
//!       │ (real binary)   │        │ (testing)     │
//!       └─────────────────┘        └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use smbmetrics_core::collector::{SmbStatusCollector, SmbStatusCommand};
//!
//! let cmd = SmbStatusCommand::locate().unwrap();
//! let collector = SmbStatusCollector::new(cmd);
//! let status = collector.status().unwrap();
//! println!("{} sessions", status.sessions.len());
//! ```
//!
//! ## Testing (with MockSmbStatus)
//!
//! ```
//! use smbmetrics_core::collector::{MockSmbStatus, SmbStatusCollector};
//!
//! let mock = MockSmbStatus::new().with_output(&["--json"], r#"{"tcons": {}}"#);
//! let status = SmbStatusCollector::new(mock).status().unwrap();
//! assert!(status.is_empty());
//! ```

mod command;
pub mod mock;
mod smbstatus;

pub use command::{CollectError, SMBSTATUS_PATHS, SmbStatusCommand, StatusCommand, run_command};
pub use mock::MockSmbStatus;
pub use smbstatus::SmbStatusCollector;
