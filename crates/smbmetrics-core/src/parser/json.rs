//! Parser for `smbstatus --json` documents.
//!
//! One superset record type covers every schema revision, so decoding is a
//! single `serde_json` call per document. Missing sections decode as empty
//! maps (status) or `None` (profile).

use super::ParseError;
use crate::model::{ProfileSnapshot, SmbStatus};

/// Parses the output of `smbstatus --json` and its `-S`/`-p`/`-L` variants.
pub fn parse_status(data: &str) -> Result<SmbStatus, ParseError> {
    Ok(serde_json::from_str(data)?)
}

/// Parses the output of `smbstatus --profile --json`.
pub fn parse_profile(data: &str) -> Result<ProfileSnapshot, ParseError> {
    Ok(serde_json::from_str(data)?)
}

/// Splits an `Extended Profile` key of the form `<share>:[<client>]`.
///
/// Returns `("", "")` for any other shape, including an empty share or an
/// empty address.
pub fn split_extended_key(key: &str) -> (&str, &str) {
    let Some((share, rest)) = key.split_once(':') else {
        return ("", "");
    };
    let client = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or("");
    if share.is_empty() || client.is_empty() {
        return ("", "");
    }
    (share, client)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE1: &str = include_str!("../../testdata/smbstatus-simple1.json");
    const SIMPLE2: &str = include_str!("../../testdata/smbstatus-simple2.json");
    const ALL1: &str = include_str!("../../testdata/smbstatus-all1.json");
    const LOCKS: &str = include_str!("../../testdata/smbstatus-locks.json");
    const OPENFILES: &str = include_str!("../../testdata/smbstatus-openfiles.json");
    const PROFILE: &str = include_str!("../../testdata/smbstatus-profile.json");
    const NODATA: &str = include_str!("../../testdata/smbstatus-nodata.json");

    #[test]
    fn test_parse_tcons() {
        let status = parse_status(SIMPLE1).unwrap();
        assert_eq!(status.tcons.len(), 2);
        assert_eq!(status.version, "4.17.8");

        let status = parse_status(SIMPLE2).unwrap();
        let tcons = status.list_tree_cons();
        assert_eq!(tcons.len(), 1);
        assert_eq!(tcons[0].service, "share1");
        assert_eq!(tcons[0].server_id.pid, "355");
        assert_eq!(tcons[0].server_id.unique_id, "9716458563658815452");
        assert_eq!(tcons[0].tcon_id, "3929567829");
        assert_eq!(tcons[0].machine, "::1");
    }

    #[test]
    fn test_parse_sessions_and_tcons() {
        let status = parse_status(ALL1).unwrap();
        assert_eq!(status.sessions.len(), 1);
        assert_eq!(status.tcons.len(), 1);
        assert!(status.open_files.is_empty());

        let session = &status.sessions["2091581478"];
        assert_eq!(session.username, "alice");
        assert_eq!(session.uid, 1000);
        assert_eq!(session.gid, 1000);
        assert_eq!(session.session_dialect, "SMB3_11");
        assert_eq!(session.signing.degree, "partial");
        assert_eq!(session.channels.len(), 1);
        assert_eq!(session.channels["1"].transport, "tcp");
        assert!(session.client_guid.is_some());
    }

    #[test]
    fn test_parse_locked_files() {
        let status = parse_status(LOCKS).unwrap();
        let locks: Vec<_> = status.locked_files.values().collect();
        assert_eq!(locks.len(), 2);
        assert_eq!(locks[0].fileid.inode, 61);
        assert_eq!(locks[0].num_pending_deletes, 0);
        assert!(locks[0].opens.is_empty());
        assert_eq!(locks[1].fileid.inode, 52);
        assert_eq!(locks[1].num_pending_deletes, 2);
        assert_eq!(status.list_open_files().len(), 2);
    }

    #[test]
    fn test_parse_open_files() {
        let status = parse_status(OPENFILES).unwrap();
        assert_eq!(status.open_files.len(), 2);

        let aa = &status.open_files["/A/a"];
        assert_eq!(aa.opens.len(), 2);
        for open in aa.opens.values() {
            assert!(!open.oplock.batch);
            assert!(open.oplock.level_ii);
            assert!(!open.oplock.exclusive);
            assert_eq!(open.oplock.text, "LEVEL_II");
            assert!(!open.lease.read);
            assert!(!open.lease.write);
            assert!(!open.lease.handle);
            assert_eq!(open.lease.text, "");
        }

        let ab = &status.open_files["/A/b"];
        assert_eq!(ab.opens.len(), 2);
        let leased: Vec<_> = ab.opens.values().filter(|o| o.oplock.lease).collect();
        assert_eq!(leased.len(), 1);
        assert!(!leased[0].oplock.level_ii);
        assert_eq!(leased[0].oplock.text, "LEASE");
        assert!(leased[0].lease.read);
        assert!(leased[0].lease.write);
        assert!(!leased[0].lease.handle);
        assert_eq!(leased[0].lease.text, "LEASE(RW)");
        assert!(leased[0].access_mask.is_read_write());
        assert_eq!(leased[0].share_file_id, "13");
    }

    #[test]
    fn test_parse_profile() {
        let profile = parse_profile(PROFILE).unwrap();

        let smbd_loop = profile.sections.smbd_loop.as_ref().unwrap();
        assert_eq!(smbd_loop.connect.unwrap().count, 1);
        assert_eq!(smbd_loop.cpu_system.unwrap().time, 667333);
        assert_eq!(smbd_loop.request.unwrap().count, 1292);

        let syscalls = profile.sections.system_calls.as_ref().unwrap();
        assert_eq!(syscalls.asys_pread.unwrap().count, 6);
        assert_eq!(syscalls.asys_pwrite.unwrap().bytes, 90177536);
        assert_eq!(syscalls.asys_fsync.unwrap().count, 47);

        let smb2 = profile.sections.smb2_calls.as_ref().unwrap();
        assert_eq!(smb2.read.unwrap().outbytes, 10486240);
        assert_eq!(smb2.write.unwrap().inbytes, 90180784);
        assert_eq!(smb2.notify.unwrap().idle, 1001532);

        assert_eq!(profile.extended.len(), 3);
        let share_a = &profile.extended["shareA:[192.168.1.5]"];
        assert!(share_a.smbd_loop.is_none());
        assert_eq!(
            share_a.smb2_calls.as_ref().unwrap().write.unwrap().inbytes,
            81920000
        );
    }

    #[test]
    fn test_parse_profile_no_data() {
        let profile = parse_profile(NODATA).unwrap();
        assert!(profile.sections.smbd_loop.is_none());
        assert!(profile.sections.system_calls.is_none());
        assert!(profile.sections.smb2_calls.is_none());
        assert!(profile.extended.is_empty());
        assert_eq!(profile.version, "4.17.8");
    }

    #[test]
    fn test_empty_object_is_empty_snapshot() {
        let status = parse_status("{}").unwrap();
        assert!(status.is_empty());
        assert!(parse_profile("{}").unwrap().sections.is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        let err = parse_status("{\"tcons\": ").unwrap_err();
        assert!(err.message.contains("line 1"));
        assert!(parse_profile("not json").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn test_split_extended_key() {
        assert_eq!(
            split_extended_key("shareA:[192.168.1.5]"),
            ("shareA", "192.168.1.5")
        );
        assert_eq!(split_extended_key("shareB:[fd00::12]"), ("shareB", "fd00::12"));
        assert_eq!(split_extended_key("malformed"), ("", ""));
        assert_eq!(split_extended_key("share:192.168.1.5"), ("", ""));
        assert_eq!(split_extended_key(":[10.0.0.1]"), ("", ""));
        assert_eq!(split_extended_key("share:[]"), ("", ""));
        assert_eq!(split_extended_key("share:[10.0.0.1"), ("", ""));
    }
}
