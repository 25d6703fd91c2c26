//! Session, tree-connection and open-file state reported by `smbstatus`.
//!
//! The same record types serve every schema revision of the JSON output:
//! fields added by newer Samba releases are optional and decode to their zero
//! value when absent. Text-mode output is converted into these types as well
//! (see [`super::records`]).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::util::parse_time;

use super::de::{lenient_i64, lenient_string, lenient_u64};

/// Name of the inter-process-communication pseudo share.
///
/// Tree connections to it are administrative and never count as user activity.
pub const IPC_SERVICE: &str = "IPC$";

/// Identity of the smbd process owning a session, tcon or open.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ServerId {
    #[serde(deserialize_with = "lenient_string")]
    pub pid: String,
    #[serde(deserialize_with = "lenient_string")]
    pub task_id: String,
    /// Cluster node number (CTDB virtual node), `4294967295` when not clustered.
    #[serde(deserialize_with = "lenient_string")]
    pub vnn: String,
    #[serde(deserialize_with = "lenient_string")]
    pub unique_id: String,
}

/// Encryption or signing descriptor: algorithm plus how much traffic it covers.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CryptoInfo {
    pub cipher: String,
    /// One of `none`, `partial`, `full` (free-form in text mode).
    pub degree: String,
}

/// One transport channel bound to a multi-channel session.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Channel {
    #[serde(deserialize_with = "lenient_string")]
    pub channel_id: String,
    pub creation_time: String,
    pub local_address: String,
    pub remote_address: String,
    pub transport: String,
}

/// An authenticated client session.
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Session {
    #[serde(deserialize_with = "lenient_string")]
    pub session_id: String,
    pub server_id: ServerId,
    #[serde(deserialize_with = "lenient_i64")]
    pub uid: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub gid: i64,
    pub username: String,
    pub groupname: String,
    pub creation_time: Option<String>,
    pub expiration_time: Option<String>,
    pub auth_time: Option<String>,
    pub remote_machine: String,
    pub hostname: String,
    pub session_dialect: String,
    pub client_guid: Option<String>,
    pub encryption: CryptoInfo,
    pub signing: CryptoInfo,
    pub channels: BTreeMap<String, Channel>,
}

/// A client's attachment to one share ("service").
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct TreeCon {
    pub service: String,
    pub server_id: ServerId,
    #[serde(deserialize_with = "lenient_string")]
    pub tcon_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub session_id: String,
    pub machine: String,
    pub connected_at: String,
    pub encryption: CryptoInfo,
    pub signing: CryptoInfo,
}

impl TreeCon {
    /// Whether this is a connection to the `IPC$` pseudo share.
    pub fn is_ipc(&self) -> bool {
        self.service == IPC_SERVICE
    }

    /// `connected_at` as a timestamp, if it is in a known layout.
    pub fn connected_time(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.connected_at).ok()
    }
}

/// Device/inode/extent triple identifying a file on the server.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FileId {
    #[serde(deserialize_with = "lenient_u64")]
    pub devid: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub inode: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub extid: u64,
}

/// Share-mode flags an opener granted to concurrent openers.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ShareMode {
    pub hex: String,
    #[serde(rename = "NONE")]
    pub none: bool,
    #[serde(rename = "READ")]
    pub read: bool,
    #[serde(rename = "WRITE")]
    pub write: bool,
    #[serde(rename = "DELETE")]
    pub delete: bool,
    pub text: String,
}

/// Access rights requested by an opener.
///
/// `text` is Samba's summary of the data access: `R`, `W` or `RW`.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AccessMask {
    pub hex: String,
    #[serde(rename = "READ_DATA")]
    pub read_data: bool,
    #[serde(rename = "WRITE_DATA")]
    pub write_data: bool,
    #[serde(rename = "APPEND_DATA")]
    pub append_data: bool,
    #[serde(rename = "READ_EA")]
    pub read_ea: bool,
    #[serde(rename = "WRITE_EA")]
    pub write_ea: bool,
    #[serde(rename = "EXECUTE")]
    pub execute: bool,
    #[serde(rename = "READ_ATTRIBUTES")]
    pub read_attributes: bool,
    #[serde(rename = "WRITE_ATTRIBUTES")]
    pub write_attributes: bool,
    #[serde(rename = "DELETE_CHILD")]
    pub delete_child: bool,
    #[serde(rename = "DELETE")]
    pub delete: bool,
    #[serde(rename = "READ_CONTROL")]
    pub read_control: bool,
    #[serde(rename = "WRITE_DAC")]
    pub write_dac: bool,
    #[serde(rename = "SYNCHRONIZE")]
    pub synchronize: bool,
    #[serde(rename = "ACCESS_SYSTEM_SECURITY")]
    pub access_system_security: bool,
    pub text: String,
}

impl AccessMask {
    /// Whether the summary grants both read and write data access.
    pub fn is_read_write(&self) -> bool {
        self.text.contains('R') && self.text.contains('W')
    }
}

/// Client-side caching granted on an open (lease or oplock derived).
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Caching {
    #[serde(rename = "READ")]
    pub read: bool,
    #[serde(rename = "WRITE")]
    pub write: bool,
    #[serde(rename = "HANDLE")]
    pub handle: bool,
    pub hex: String,
    pub text: String,
}

#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct OpLock {
    #[serde(rename = "EXCLUSIVE")]
    pub exclusive: bool,
    #[serde(rename = "BATCH")]
    pub batch: bool,
    #[serde(rename = "LEVEL_II")]
    pub level_ii: bool,
    #[serde(rename = "LEASE")]
    pub lease: bool,
    pub text: String,
}

/// SMB2 lease state; an empty object when the open holds no lease.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Lease {
    #[serde(rename = "LEASE_KEY")]
    pub lease_key: String,
    #[serde(rename = "READ")]
    pub read: bool,
    #[serde(rename = "WRITE")]
    pub write: bool,
    #[serde(rename = "HANDLE")]
    pub handle: bool,
    pub hex: String,
    pub text: String,
}

/// One opener of a file.
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct OpenInfo {
    pub server_id: ServerId,
    #[serde(deserialize_with = "lenient_i64")]
    pub uid: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub share_file_id: String,
    pub opened_at: String,
    pub sharemode: ShareMode,
    pub access_mask: AccessMask,
    pub caching: Caching,
    pub oplock: OpLock,
    pub lease: Lease,
}

impl OpenInfo {
    pub fn opened_time(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.opened_at).ok()
    }
}

/// A file held open on the server.
///
/// Older releases report `locked_files` entries that carry everything but
/// `opens`; those decode into this type with an empty `opens` map.
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct OpenFile {
    pub service_path: String,
    pub filename: String,
    pub fileid: FileId,
    #[serde(deserialize_with = "lenient_u64")]
    pub num_pending_deletes: u64,
    /// Keyed by `<pid>/<share_file_id>`.
    pub opens: BTreeMap<String, OpenInfo>,
}

/// A point-in-time capture of `smbstatus` state.
///
/// Which maps are populated depends on the invocation: `-S` fills `tcons`,
/// `-p` fills `sessions`, `-L` fills `open_files` (or `locked_files` on old
/// releases), and a bare `--json` run fills all of them.
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct SmbStatus {
    pub timestamp: String,
    pub version: String,
    pub smb_conf: String,
    pub sessions: BTreeMap<String, Session>,
    pub tcons: BTreeMap<String, TreeCon>,
    pub open_files: BTreeMap<String, OpenFile>,
    pub locked_files: BTreeMap<String, OpenFile>,
}

impl SmbStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
            && self.tcons.is_empty()
            && self.open_files.is_empty()
            && self.locked_files.is_empty()
    }

    /// Folds the result of another invocation into this snapshot.
    ///
    /// Header fields keep their first non-empty value; on key collisions the
    /// entry from `other` wins.
    pub fn merge(&mut self, other: SmbStatus) {
        if self.timestamp.is_empty() {
            self.timestamp = other.timestamp;
        }
        if self.version.is_empty() {
            self.version = other.version;
        }
        if self.smb_conf.is_empty() {
            self.smb_conf = other.smb_conf;
        }
        self.sessions.extend(other.sessions);
        self.tcons.extend(other.tcons);
        self.open_files.extend(other.open_files);
        self.locked_files.extend(other.locked_files);
    }

    pub fn list_sessions(&self) -> Vec<&Session> {
        self.sessions.values().collect()
    }

    pub fn list_tree_cons(&self) -> Vec<&TreeCon> {
        self.tcons.values().collect()
    }

    /// Open files from either schema revision.
    pub fn list_open_files(&self) -> Vec<&OpenFile> {
        self.open_files
            .values()
            .chain(self.locked_files.values())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcon(service: &str, machine: &str) -> TreeCon {
        TreeCon {
            service: service.to_string(),
            machine: machine.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_ipc() {
        assert!(tcon("IPC$", "::1").is_ipc());
        assert!(!tcon("share1", "::1").is_ipc());
        assert!(!tcon("ipc$", "::1").is_ipc());
    }

    #[test]
    fn test_parsed_timestamps() {
        let mut t = tcon("share1", "::1");
        t.connected_at = "Wed Jun 14 10:01:02 AM 2023 UTC".to_string();
        assert_eq!(t.connected_time().map(|d| d.timestamp()), Some(1686736862));
        assert_eq!(tcon("share1", "::1").connected_time(), None);

        let open = OpenInfo {
            opened_at: "2023-06-14T10:01:02.567711+00:00".to_string(),
            ..Default::default()
        };
        assert_eq!(open.opened_time().map(|d| d.timestamp()), Some(1686736862));
    }

    #[test]
    fn test_access_mask_read_write() {
        let mut mask = AccessMask::default();
        assert!(!mask.is_read_write());
        mask.text = "R".to_string();
        assert!(!mask.is_read_write());
        mask.text = "W".to_string();
        assert!(!mask.is_read_write());
        mask.text = "RW".to_string();
        assert!(mask.is_read_write());
    }

    #[test]
    fn test_merge_combines_categories() {
        let mut base = SmbStatus::new();
        base.tcons.insert("1".to_string(), tcon("share1", "10.0.0.1"));

        let mut other = SmbStatus {
            timestamp: "2024-01-01T00:00:00+0000".to_string(),
            version: "4.19.4".to_string(),
            ..Default::default()
        };
        other.sessions.insert("7".to_string(), Session::default());
        other.tcons.insert("2".to_string(), tcon("share2", "10.0.0.2"));

        base.merge(other);
        assert_eq!(base.version, "4.19.4");
        assert_eq!(base.timestamp, "2024-01-01T00:00:00+0000");
        assert_eq!(base.sessions.len(), 1);
        assert_eq!(base.tcons.len(), 2);
        assert!(!base.is_empty());
    }

    #[test]
    fn test_list_open_files_spans_revisions() {
        let mut status = SmbStatus::new();
        status
            .open_files
            .insert("/A/a".to_string(), OpenFile::default());
        status
            .locked_files
            .insert("/B/b".to_string(), OpenFile::default());
        assert_eq!(status.list_open_files().len(), 2);
    }
}
