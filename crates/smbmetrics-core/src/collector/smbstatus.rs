//! Category-level collection on top of a [`StatusCommand`].
//!
//! Each status category asks for JSON first and falls back to the legacy text
//! table when the installed `smbstatus` rejects `--json`. Text records are
//! converted into the same model the JSON parser produces.

use tracing::{debug, warn};

use super::command::{CollectError, StatusCommand};
use crate::model::{ProfileSnapshot, Session, SmbStatus, TreeCon, open_files_from_locks};
use crate::parser::{json, text};

/// Collects `smbstatus` captures through a command runner.
#[derive(Debug, Clone)]
pub struct SmbStatusCollector<C: StatusCommand> {
    cmd: C,
}

impl<C: StatusCommand> SmbStatusCollector<C> {
    pub fn new(cmd: C) -> Self {
        Self { cmd }
    }

    pub fn command(&self) -> &C {
        &self.cmd
    }

    /// Output of `smbstatus --version`, e.g. `Version 4.19.4`.
    pub fn version(&self) -> Result<String, CollectError> {
        self.cmd.run(&["--version"])
    }

    /// Tree connections (`-S`).
    pub fn shares(&self) -> Result<SmbStatus, CollectError> {
        self.json_or_text(&["-S", "--json"], &["-S"], |out| {
            let mut status = SmbStatus::new();
            for (idx, share) in text::parse_shares(out)?.into_iter().enumerate() {
                let key = format!("{}/{}", share.pid, idx);
                status.tcons.insert(key, TreeCon::from(share));
            }
            Ok(status)
        })
    }

    /// Sessions (`-p`).
    pub fn sessions(&self) -> Result<SmbStatus, CollectError> {
        self.json_or_text(&["-p", "--json"], &["-p"], |out| {
            let mut status = SmbStatus::new();
            for (idx, proc) in text::parse_procs(out)?.into_iter().enumerate() {
                let key = format!("{}/{}", proc.pid, idx);
                status.sessions.insert(key, Session::from(proc));
            }
            Ok(status)
        })
    }

    /// Open files (`-L`).
    pub fn locks(&self) -> Result<SmbStatus, CollectError> {
        self.json_or_text(&["-L", "--json"], &["-L"], |out| {
            let mut status = SmbStatus::new();
            status.open_files = open_files_from_locks(text::parse_locks(out)?);
            Ok(status)
        })
    }

    /// Full status capture.
    ///
    /// Uses a single `--json` run when supported; otherwise merges the
    /// per-category captures, skipping categories that fail. Errors only when
    /// every category fails.
    pub fn status(&self) -> Result<SmbStatus, CollectError> {
        match self.cmd.run(&["--json"]) {
            Ok(out) => return Ok(json::parse_status(&out)?),
            Err(e) => debug!(error = %e, "smbstatus --json unavailable, collecting per category"),
        }

        let mut status = SmbStatus::new();
        let mut last_err = None;
        let mut collected = 0;

        for (category, result) in [
            ("sessions", self.sessions()),
            ("shares", self.shares()),
            ("locks", self.locks()),
        ] {
            match result {
                Ok(part) => {
                    status.merge(part);
                    collected += 1;
                }
                Err(e) => {
                    warn!(category, error = %e, "smbstatus category unavailable");
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if collected == 0 => Err(e),
            _ => Ok(status),
        }
    }

    /// Profiling counters (`--profile --json`). There is no text fallback.
    pub fn profile(&self) -> Result<ProfileSnapshot, CollectError> {
        let out = self.cmd.run(&["--profile", "--json"])?;
        Ok(json::parse_profile(&out)?)
    }

    fn json_or_text(
        &self,
        json_args: &[&str],
        text_args: &[&str],
        parse_text: impl FnOnce(&str) -> Result<SmbStatus, crate::parser::ParseError>,
    ) -> Result<SmbStatus, CollectError> {
        match self.cmd.run(json_args) {
            Ok(out) => return Ok(json::parse_status(&out)?),
            Err(e) => debug!(args = ?json_args, error = %e, "JSON output unavailable, falling back to text"),
        }
        let out = self.cmd.run(text_args)?;
        Ok(parse_text(&out)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockSmbStatus;

    const SIMPLE1: &str = include_str!("../../testdata/smbstatus-simple1.json");
    const ALL1: &str = include_str!("../../testdata/smbstatus-all1.json");
    const OPENFILES: &str = include_str!("../../testdata/smbstatus-openfiles.json");
    const PROFILE: &str = include_str!("../../testdata/smbstatus-profile.json");

    const SHARES_TEXT: &str = "
Service      pid     Machine       Connected at                     Encryption   Signing
---------------------------------------------------------------------------------------------
IPC$         12345   192.168.1.10  Wed Jun 14 10:01:01 AM 2023 UTC  -            -
share1       12345   192.168.1.10  Wed Jun 14 10:01:02 AM 2023 UTC  -            -
share2       12346   192.168.1.11  Wed Jun 14 10:02:00 AM 2023 UTC  -            -
";

    const PROCS_TEXT: &str = "
Samba version 4.10.16
PID     Username     Group        Machine                                   Protocol Version  Encryption           Signing
----------------------------------------------------------------------------------------------------------------------------------------
12345   alice        users        192.168.1.10 (ipv4:192.168.1.10:50412)    SMB3_11           -                    -
";

    const LOCKS_TEXT: &str = "
Locked files:
Pid          User(ID)   DenyMode   Access      R/W        Oplock           SharePath      Name    Time
--------------------------------------------------------------------------------------------------
12345        1000       DENY_NONE  0x12019f    RDWR       LEASE(RWH)       /srv/share1    a.txt   Wed Jun 14 10:01:02 2023
";

    #[test]
    fn test_version() {
        let mock = MockSmbStatus::new().with_output(&["--version"], "Version 4.19.4\n");
        let collector = SmbStatusCollector::new(mock);
        assert_eq!(collector.version().unwrap(), "Version 4.19.4");
    }

    #[test]
    fn test_shares_prefers_json() {
        let mock = MockSmbStatus::new()
            .with_output(&["-S", "--json"], SIMPLE1)
            .with_output(&["-S"], SHARES_TEXT);
        let status = SmbStatusCollector::new(mock).shares().unwrap();
        assert_eq!(status.tcons.len(), 2);
        assert!(status.tcons.contains_key("3929567829"));
    }

    #[test]
    fn test_shares_text_fallback() {
        let mock = MockSmbStatus::new().with_output(&["-S"], SHARES_TEXT);
        let status = SmbStatusCollector::new(mock).shares().unwrap();

        assert_eq!(status.tcons.len(), 2);
        let tcons = status.list_tree_cons();
        assert_eq!(tcons[0].service, "share1");
        assert_eq!(tcons[0].server_id.pid, "12345");
        assert_eq!(tcons[1].machine, "192.168.1.11");
    }

    #[test]
    fn test_json_parse_error_is_not_masked() {
        let mock = MockSmbStatus::new()
            .with_output(&["-S", "--json"], "{broken")
            .with_output(&["-S"], SHARES_TEXT);
        let err = SmbStatusCollector::new(mock).shares().unwrap_err();
        assert!(matches!(err, CollectError::Parse(_)));
    }

    #[test]
    fn test_status_full_json() {
        let mock = MockSmbStatus::new().with_output(&["--json"], ALL1);
        let status = SmbStatusCollector::new(mock).status().unwrap();
        assert_eq!(status.sessions.len(), 1);
        assert_eq!(status.tcons.len(), 1);
    }

    #[test]
    fn test_status_merges_categories() {
        let mock = MockSmbStatus::new()
            .with_output(&["-p"], PROCS_TEXT)
            .with_output(&["-S"], SHARES_TEXT)
            .with_output(&["-L", "--json"], OPENFILES);
        let status = SmbStatusCollector::new(mock).status().unwrap();

        assert_eq!(status.sessions.len(), 1);
        assert_eq!(status.list_sessions()[0].username, "alice");
        assert_eq!(status.tcons.len(), 2);
        assert_eq!(status.open_files.len(), 2);
    }

    #[test]
    fn test_status_text_locks() {
        let mock = MockSmbStatus::new().with_output(&["-L"], LOCKS_TEXT);
        let status = SmbStatusCollector::new(mock).status().unwrap();

        assert!(status.sessions.is_empty());
        assert!(status.tcons.is_empty());
        let file = &status.open_files["/srv/share1/a.txt"];
        assert_eq!(file.opens.len(), 1);
        assert!(file.opens.values().all(|o| o.access_mask.is_read_write()));
    }

    #[test]
    fn test_status_all_categories_fail() {
        let collector = SmbStatusCollector::new(MockSmbStatus::new());
        assert!(matches!(collector.status(), Err(CollectError::Command(_))));
    }

    #[test]
    fn test_profile() {
        let mock = MockSmbStatus::new().with_output(&["--profile", "--json"], PROFILE);
        let profile = SmbStatusCollector::new(mock).profile().unwrap();
        assert!(profile.sections.smb2_calls.is_some());

        let collector = SmbStatusCollector::new(MockSmbStatus::new().with_output(&["--profile"], "x"));
        assert!(collector.profile().is_err());
    }
}
