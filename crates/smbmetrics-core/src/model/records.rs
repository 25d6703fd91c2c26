//! Rows of the legacy text output, and their conversion into the status model.
//!
//! Text mode carries only a subset of what the JSON output has; converted
//! records leave the missing fields at their zero value.

use std::collections::BTreeMap;

use super::status::{AccessMask, CryptoInfo, OpLock, OpenFile, OpenInfo, Session, ShareMode, TreeCon};

/// One row of `smbstatus -S`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ShareRecord {
    pub service: String,
    pub pid: String,
    pub machine: String,
    pub connected_at: String,
    pub encryption: String,
    pub signing: String,
}

/// One row of `smbstatus -p`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ProcRecord {
    pub pid: String,
    pub username: String,
    pub group: String,
    pub machine: String,
    pub protocol_version: String,
    pub encryption: String,
    pub signing: String,
}

/// One row of `smbstatus -L`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LockRecord {
    pub pid: String,
    pub user_id: String,
    pub deny_mode: String,
    pub access: String,
    /// `RDONLY`, `WRONLY` or `RDWR`.
    pub rw: String,
    pub oplock: String,
    pub share_path: String,
    pub name: String,
    pub time: String,
}

impl LockRecord {
    /// Access summary in the same `R`/`W`/`RW` notation the JSON output uses.
    pub fn access_text(&self) -> &'static str {
        match self.rw.as_str() {
            "RDWR" => "RW",
            "WRONLY" => "W",
            "RDONLY" => "R",
            _ => "",
        }
    }

    fn file_key(&self) -> String {
        match (self.share_path.is_empty(), self.name.is_empty()) {
            (false, false) => format!("{}/{}", self.share_path.trim_end_matches('/'), self.name),
            (false, true) => self.share_path.clone(),
            _ => self.name.clone(),
        }
    }
}

fn crypto(cipher: &str) -> CryptoInfo {
    CryptoInfo {
        cipher: cipher.to_string(),
        degree: String::new(),
    }
}

impl From<ShareRecord> for TreeCon {
    fn from(rec: ShareRecord) -> Self {
        let mut tcon = TreeCon {
            service: rec.service,
            machine: rec.machine,
            connected_at: rec.connected_at,
            encryption: crypto(&rec.encryption),
            signing: crypto(&rec.signing),
            ..Default::default()
        };
        tcon.server_id.pid = rec.pid;
        tcon
    }
}

impl From<ProcRecord> for Session {
    fn from(rec: ProcRecord) -> Self {
        let mut session = Session {
            username: rec.username,
            groupname: rec.group,
            remote_machine: rec.machine,
            session_dialect: rec.protocol_version,
            encryption: crypto(&rec.encryption),
            signing: crypto(&rec.signing),
            ..Default::default()
        };
        session.server_id.pid = rec.pid;
        session
    }
}

/// Groups lock rows by file, one opener per row.
///
/// Files are keyed by their full path; openers by `<pid>/<row index>` since
/// text mode has no share-file id.
pub fn open_files_from_locks(locks: Vec<LockRecord>) -> BTreeMap<String, OpenFile> {
    let mut files: BTreeMap<String, OpenFile> = BTreeMap::new();

    for (idx, lock) in locks.into_iter().enumerate() {
        let key = lock.file_key();
        let file = files.entry(key).or_insert_with(|| OpenFile {
            service_path: lock.share_path.clone(),
            filename: lock.name.clone(),
            ..Default::default()
        });

        let mut open = OpenInfo {
            uid: lock.user_id.parse().unwrap_or(0),
            opened_at: lock.time.clone(),
            sharemode: ShareMode {
                text: lock.deny_mode.clone(),
                ..Default::default()
            },
            access_mask: AccessMask {
                hex: lock.access.clone(),
                text: lock.access_text().to_string(),
                ..Default::default()
            },
            oplock: OpLock {
                text: lock.oplock.clone(),
                ..Default::default()
            },
            ..Default::default()
        };
        open.server_id.pid = lock.pid.clone();
        file.opens.insert(format!("{}/{}", lock.pid, idx), open);
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(pid: &str, rw: &str, path: &str, name: &str) -> LockRecord {
        LockRecord {
            pid: pid.to_string(),
            user_id: "1000".to_string(),
            rw: rw.to_string(),
            share_path: path.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_share_record_into_tcon() {
        let tcon: TreeCon = ShareRecord {
            service: "share1".to_string(),
            pid: "355".to_string(),
            machine: "::1".to_string(),
            connected_at: "Wed Jun 14 10:01:01 AM 2023 UTC".to_string(),
            encryption: "-".to_string(),
            signing: "-".to_string(),
        }
        .into();
        assert_eq!(tcon.service, "share1");
        assert_eq!(tcon.server_id.pid, "355");
        assert_eq!(tcon.machine, "::1");
        assert_eq!(tcon.encryption.cipher, "-");
    }

    #[test]
    fn test_proc_record_into_session() {
        let session: Session = ProcRecord {
            pid: "1234".to_string(),
            username: "alice".to_string(),
            group: "users".to_string(),
            machine: "10.0.0.5".to_string(),
            protocol_version: "SMB3_11".to_string(),
            ..Default::default()
        }
        .into();
        assert_eq!(session.username, "alice");
        assert_eq!(session.groupname, "users");
        assert_eq!(session.remote_machine, "10.0.0.5");
        assert_eq!(session.session_dialect, "SMB3_11");
        assert_eq!(session.server_id.pid, "1234");
    }

    #[test]
    fn test_access_text() {
        assert_eq!(lock("1", "RDWR", "/s", "a").access_text(), "RW");
        assert_eq!(lock("1", "WRONLY", "/s", "a").access_text(), "W");
        assert_eq!(lock("1", "RDONLY", "/s", "a").access_text(), "R");
        assert_eq!(lock("1", "", "/s", "a").access_text(), "");
    }

    #[test]
    fn test_open_files_grouped_by_path() {
        let files = open_files_from_locks(vec![
            lock("100", "RDWR", "/srv/share", "a.txt"),
            lock("101", "RDONLY", "/srv/share/", "a.txt"),
            lock("100", "RDONLY", "/srv/share", "b.txt"),
        ]);
        assert_eq!(files.len(), 2);

        let a = &files["/srv/share/a.txt"];
        assert_eq!(a.filename, "a.txt");
        assert_eq!(a.opens.len(), 2);
        assert_eq!(a.opens["100/0"].access_mask.text, "RW");
        assert_eq!(a.opens["101/1"].access_mask.text, "R");
        assert_eq!(a.opens["100/0"].uid, 1000);

        assert_eq!(files["/srv/share/b.txt"].opens.len(), 1);
    }
}
