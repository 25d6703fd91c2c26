//! smbd profiling counters reported by `smbstatus --profile --json`.
//!
//! Every counter is optional: a counter missing from the capture was not
//! collected, which is different from one collected as zero. The counter sets
//! are closed; each section lists its members in [`SmbdLoop::counters`],
//! [`SystemCalls::counters`] and [`Smb2Calls::counters`].

use std::collections::BTreeMap;

use serde::Deserialize;

/// Plain `{count, time}` counter. Time is in microseconds.
#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct BasicCounter {
    pub count: u64,
    pub time: u64,
}

/// Counter for syscalls that move data.
#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct BytesCounter {
    pub count: u64,
    pub time: u64,
    pub idle: u64,
    pub bytes: u64,
}

/// Counter for protocol requests, with inbound and outbound payload sizes.
#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct IoBytesCounter {
    pub count: u64,
    pub time: u64,
    pub idle: u64,
    pub inbytes: u64,
    pub outbytes: u64,
}

/// Any of the three counter shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileCounters {
    Basic(BasicCounter),
    Bytes(BytesCounter),
    IoBytes(IoBytesCounter),
}

impl ProfileCounters {
    pub fn count(&self) -> u64 {
        match self {
            ProfileCounters::Basic(c) => c.count,
            ProfileCounters::Bytes(c) => c.count,
            ProfileCounters::IoBytes(c) => c.count,
        }
    }

    pub fn time(&self) -> u64 {
        match self {
            ProfileCounters::Basic(c) => c.time,
            ProfileCounters::Bytes(c) => c.time,
            ProfileCounters::IoBytes(c) => c.time,
        }
    }

    /// `None` for the plain shape, which does not track idle time.
    pub fn idle(&self) -> Option<u64> {
        match self {
            ProfileCounters::Basic(_) => None,
            ProfileCounters::Bytes(c) => Some(c.idle),
            ProfileCounters::IoBytes(c) => Some(c.idle),
        }
    }

    pub fn bytes(&self) -> Option<u64> {
        match self {
            ProfileCounters::Bytes(c) => Some(c.bytes),
            _ => None,
        }
    }

    pub fn inbytes(&self) -> Option<u64> {
        match self {
            ProfileCounters::IoBytes(c) => Some(c.inbytes),
            _ => None,
        }
    }

    pub fn outbytes(&self) -> Option<u64> {
        match self {
            ProfileCounters::IoBytes(c) => Some(c.outbytes),
            _ => None,
        }
    }
}

fn push_basic(
    out: &mut Vec<(&'static str, ProfileCounters)>,
    name: &'static str,
    counter: &Option<BasicCounter>,
) {
    if let Some(c) = counter {
        out.push((name, ProfileCounters::Basic(*c)));
    }
}

fn push_bytes(
    out: &mut Vec<(&'static str, ProfileCounters)>,
    name: &'static str,
    counter: &Option<BytesCounter>,
) {
    if let Some(c) = counter {
        out.push((name, ProfileCounters::Bytes(*c)));
    }
}

fn push_iobytes(
    out: &mut Vec<(&'static str, ProfileCounters)>,
    name: &'static str,
    counter: &Option<IoBytesCounter>,
) {
    if let Some(c) = counter {
        out.push((name, ProfileCounters::IoBytes(*c)));
    }
}

/// The `SMBD loop` section: connection lifecycle and main-loop accounting.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SmbdLoop {
    pub connect: Option<BasicCounter>,
    pub disconnect: Option<BasicCounter>,
    pub idle: Option<BasicCounter>,
    pub smbd_idle: Option<BasicCounter>,
    pub cpu_user: Option<BasicCounter>,
    pub cpu_system: Option<BasicCounter>,
    pub request: Option<BasicCounter>,
    pub push_sec_ctx: Option<BasicCounter>,
    pub set_sec_ctx: Option<BasicCounter>,
    pub set_root_sec_ctx: Option<BasicCounter>,
    pub pop_sec_ctx: Option<BasicCounter>,
}

impl SmbdLoop {
    /// Counters present in this capture, in declaration order.
    pub fn counters(&self) -> Vec<(&'static str, ProfileCounters)> {
        let mut out = Vec::new();
        push_basic(&mut out, "connect", &self.connect);
        push_basic(&mut out, "disconnect", &self.disconnect);
        push_basic(&mut out, "idle", &self.idle);
        push_basic(&mut out, "smbd_idle", &self.smbd_idle);
        push_basic(&mut out, "cpu_user", &self.cpu_user);
        push_basic(&mut out, "cpu_system", &self.cpu_system);
        push_basic(&mut out, "request", &self.request);
        push_basic(&mut out, "push_sec_ctx", &self.push_sec_ctx);
        push_basic(&mut out, "set_sec_ctx", &self.set_sec_ctx);
        push_basic(&mut out, "set_root_sec_ctx", &self.set_root_sec_ctx);
        push_basic(&mut out, "pop_sec_ctx", &self.pop_sec_ctx);
        out
    }
}

/// The `System Calls` section: VFS calls issued by smbd.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SystemCalls {
    #[serde(rename = "syscall_opendir")]
    pub opendir: Option<BasicCounter>,
    #[serde(rename = "syscall_fdopendir")]
    pub fdopendir: Option<BasicCounter>,
    #[serde(rename = "syscall_readdir")]
    pub readdir: Option<BasicCounter>,
    #[serde(rename = "syscall_rewinddir")]
    pub rewinddir: Option<BasicCounter>,
    #[serde(rename = "syscall_mkdirat")]
    pub mkdirat: Option<BasicCounter>,
    #[serde(rename = "syscall_closedir")]
    pub closedir: Option<BasicCounter>,
    #[serde(rename = "syscall_open")]
    pub open: Option<BasicCounter>,
    #[serde(rename = "syscall_openat")]
    pub openat: Option<BasicCounter>,
    #[serde(rename = "syscall_createfile")]
    pub createfile: Option<BasicCounter>,
    #[serde(rename = "syscall_close")]
    pub close: Option<BasicCounter>,
    #[serde(rename = "syscall_pread")]
    pub pread: Option<BytesCounter>,
    #[serde(rename = "syscall_asys_pread")]
    pub asys_pread: Option<BytesCounter>,
    #[serde(rename = "syscall_pwrite")]
    pub pwrite: Option<BytesCounter>,
    #[serde(rename = "syscall_asys_pwrite")]
    pub asys_pwrite: Option<BytesCounter>,
    #[serde(rename = "syscall_lseek")]
    pub lseek: Option<BasicCounter>,
    #[serde(rename = "syscall_sendfile")]
    pub sendfile: Option<BytesCounter>,
    #[serde(rename = "syscall_recvfile")]
    pub recvfile: Option<BytesCounter>,
    #[serde(rename = "syscall_renameat")]
    pub renameat: Option<BasicCounter>,
    #[serde(rename = "syscall_asys_fsync")]
    pub asys_fsync: Option<BytesCounter>,
    #[serde(rename = "syscall_stat")]
    pub stat: Option<BasicCounter>,
    #[serde(rename = "syscall_fstat")]
    pub fstat: Option<BasicCounter>,
    #[serde(rename = "syscall_lstat")]
    pub lstat: Option<BasicCounter>,
    #[serde(rename = "syscall_fstatat")]
    pub fstatat: Option<BasicCounter>,
    #[serde(rename = "syscall_get_alloc_size")]
    pub get_alloc_size: Option<BasicCounter>,
    #[serde(rename = "syscall_unlinkat")]
    pub unlinkat: Option<BasicCounter>,
    #[serde(rename = "syscall_chmod")]
    pub chmod: Option<BasicCounter>,
    #[serde(rename = "syscall_fchmod")]
    pub fchmod: Option<BasicCounter>,
    #[serde(rename = "syscall_fchown")]
    pub fchown: Option<BasicCounter>,
    #[serde(rename = "syscall_lchown")]
    pub lchown: Option<BasicCounter>,
    #[serde(rename = "syscall_chdir")]
    pub chdir: Option<BasicCounter>,
    #[serde(rename = "syscall_getwd")]
    pub getwd: Option<BasicCounter>,
    #[serde(rename = "syscall_fntimes")]
    pub fntimes: Option<BasicCounter>,
    #[serde(rename = "syscall_ftruncate")]
    pub ftruncate: Option<BasicCounter>,
    #[serde(rename = "syscall_fallocate")]
    pub fallocate: Option<BasicCounter>,
    #[serde(rename = "syscall_fcntl_lock")]
    pub fcntl_lock: Option<BasicCounter>,
    #[serde(rename = "syscall_fcntl")]
    pub fcntl: Option<BasicCounter>,
    #[serde(rename = "syscall_linux_setlease")]
    pub linux_setlease: Option<BasicCounter>,
    #[serde(rename = "syscall_fcntl_getlock")]
    pub fcntl_getlock: Option<BasicCounter>,
    #[serde(rename = "syscall_readlinkat")]
    pub readlinkat: Option<BasicCounter>,
    #[serde(rename = "syscall_symlinkat")]
    pub symlinkat: Option<BasicCounter>,
    #[serde(rename = "syscall_linkat")]
    pub linkat: Option<BasicCounter>,
    #[serde(rename = "syscall_mknodat")]
    pub mknodat: Option<BasicCounter>,
    #[serde(rename = "syscall_realpath")]
    pub realpath: Option<BasicCounter>,
    #[serde(rename = "syscall_get_quota")]
    pub get_quota: Option<BasicCounter>,
    #[serde(rename = "syscall_set_quota")]
    pub set_quota: Option<BasicCounter>,
    #[serde(rename = "syscall_get_sd")]
    pub get_sd: Option<BasicCounter>,
    #[serde(rename = "syscall_set_sd")]
    pub set_sd: Option<BasicCounter>,
    #[serde(rename = "syscall_brl_lock")]
    pub brl_lock: Option<BasicCounter>,
    #[serde(rename = "syscall_brl_unlock")]
    pub brl_unlock: Option<BasicCounter>,
    #[serde(rename = "syscall_brl_cancel")]
    pub brl_cancel: Option<BasicCounter>,
    #[serde(rename = "syscall_asys_getxattrat")]
    pub asys_getxattrat: Option<BytesCounter>,
}

impl SystemCalls {
    /// Counters present in this capture, named without the `syscall_` prefix.
    pub fn counters(&self) -> Vec<(&'static str, ProfileCounters)> {
        let mut out = Vec::new();
        push_basic(&mut out, "opendir", &self.opendir);
        push_basic(&mut out, "fdopendir", &self.fdopendir);
        push_basic(&mut out, "readdir", &self.readdir);
        push_basic(&mut out, "rewinddir", &self.rewinddir);
        push_basic(&mut out, "mkdirat", &self.mkdirat);
        push_basic(&mut out, "closedir", &self.closedir);
        push_basic(&mut out, "open", &self.open);
        push_basic(&mut out, "openat", &self.openat);
        push_basic(&mut out, "createfile", &self.createfile);
        push_basic(&mut out, "close", &self.close);
        push_bytes(&mut out, "pread", &self.pread);
        push_bytes(&mut out, "asys_pread", &self.asys_pread);
        push_bytes(&mut out, "pwrite", &self.pwrite);
        push_bytes(&mut out, "asys_pwrite", &self.asys_pwrite);
        push_basic(&mut out, "lseek", &self.lseek);
        push_bytes(&mut out, "sendfile", &self.sendfile);
        push_bytes(&mut out, "recvfile", &self.recvfile);
        push_basic(&mut out, "renameat", &self.renameat);
        push_bytes(&mut out, "asys_fsync", &self.asys_fsync);
        push_basic(&mut out, "stat", &self.stat);
        push_basic(&mut out, "fstat", &self.fstat);
        push_basic(&mut out, "lstat", &self.lstat);
        push_basic(&mut out, "fstatat", &self.fstatat);
        push_basic(&mut out, "get_alloc_size", &self.get_alloc_size);
        push_basic(&mut out, "unlinkat", &self.unlinkat);
        push_basic(&mut out, "chmod", &self.chmod);
        push_basic(&mut out, "fchmod", &self.fchmod);
        push_basic(&mut out, "fchown", &self.fchown);
        push_basic(&mut out, "lchown", &self.lchown);
        push_basic(&mut out, "chdir", &self.chdir);
        push_basic(&mut out, "getwd", &self.getwd);
        push_basic(&mut out, "fntimes", &self.fntimes);
        push_basic(&mut out, "ftruncate", &self.ftruncate);
        push_basic(&mut out, "fallocate", &self.fallocate);
        push_basic(&mut out, "fcntl_lock", &self.fcntl_lock);
        push_basic(&mut out, "fcntl", &self.fcntl);
        push_basic(&mut out, "linux_setlease", &self.linux_setlease);
        push_basic(&mut out, "fcntl_getlock", &self.fcntl_getlock);
        push_basic(&mut out, "readlinkat", &self.readlinkat);
        push_basic(&mut out, "symlinkat", &self.symlinkat);
        push_basic(&mut out, "linkat", &self.linkat);
        push_basic(&mut out, "mknodat", &self.mknodat);
        push_basic(&mut out, "realpath", &self.realpath);
        push_basic(&mut out, "get_quota", &self.get_quota);
        push_basic(&mut out, "set_quota", &self.set_quota);
        push_basic(&mut out, "get_sd", &self.get_sd);
        push_basic(&mut out, "set_sd", &self.set_sd);
        push_basic(&mut out, "brl_lock", &self.brl_lock);
        push_basic(&mut out, "brl_unlock", &self.brl_unlock);
        push_basic(&mut out, "brl_cancel", &self.brl_cancel);
        push_bytes(&mut out, "asys_getxattrat", &self.asys_getxattrat);
        out
    }
}

/// The `SMB2 Calls` section: one counter per SMB2 command.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Smb2Calls {
    #[serde(rename = "smb2_negprot")]
    pub negprot: Option<IoBytesCounter>,
    #[serde(rename = "smb2_sesssetup")]
    pub sesssetup: Option<IoBytesCounter>,
    #[serde(rename = "smb2_logoff")]
    pub logoff: Option<IoBytesCounter>,
    #[serde(rename = "smb2_tcon")]
    pub tcon: Option<IoBytesCounter>,
    #[serde(rename = "smb2_tdis")]
    pub tdis: Option<IoBytesCounter>,
    #[serde(rename = "smb2_create")]
    pub create: Option<IoBytesCounter>,
    #[serde(rename = "smb2_close")]
    pub close: Option<IoBytesCounter>,
    #[serde(rename = "smb2_flush")]
    pub flush: Option<IoBytesCounter>,
    #[serde(rename = "smb2_read")]
    pub read: Option<IoBytesCounter>,
    #[serde(rename = "smb2_write")]
    pub write: Option<IoBytesCounter>,
    #[serde(rename = "smb2_lock")]
    pub lock: Option<IoBytesCounter>,
    #[serde(rename = "smb2_ioctl")]
    pub ioctl: Option<IoBytesCounter>,
    #[serde(rename = "smb2_cancel")]
    pub cancel: Option<IoBytesCounter>,
    #[serde(rename = "smb2_keepalive")]
    pub keepalive: Option<IoBytesCounter>,
    #[serde(rename = "smb2_find")]
    pub find: Option<IoBytesCounter>,
    #[serde(rename = "smb2_notify")]
    pub notify: Option<IoBytesCounter>,
    #[serde(rename = "smb2_getinfo")]
    pub getinfo: Option<IoBytesCounter>,
    #[serde(rename = "smb2_setinfo")]
    pub setinfo: Option<IoBytesCounter>,
    #[serde(rename = "smb2_break")]
    pub oplock_break: Option<IoBytesCounter>,
}

impl Smb2Calls {
    /// Counters present in this capture, named without the `smb2_` prefix.
    pub fn counters(&self) -> Vec<(&'static str, ProfileCounters)> {
        let mut out = Vec::new();
        push_iobytes(&mut out, "negprot", &self.negprot);
        push_iobytes(&mut out, "sesssetup", &self.sesssetup);
        push_iobytes(&mut out, "logoff", &self.logoff);
        push_iobytes(&mut out, "tcon", &self.tcon);
        push_iobytes(&mut out, "tdis", &self.tdis);
        push_iobytes(&mut out, "create", &self.create);
        push_iobytes(&mut out, "close", &self.close);
        push_iobytes(&mut out, "flush", &self.flush);
        push_iobytes(&mut out, "read", &self.read);
        push_iobytes(&mut out, "write", &self.write);
        push_iobytes(&mut out, "lock", &self.lock);
        push_iobytes(&mut out, "ioctl", &self.ioctl);
        push_iobytes(&mut out, "cancel", &self.cancel);
        push_iobytes(&mut out, "keepalive", &self.keepalive);
        push_iobytes(&mut out, "find", &self.find);
        push_iobytes(&mut out, "notify", &self.notify);
        push_iobytes(&mut out, "getinfo", &self.getinfo);
        push_iobytes(&mut out, "setinfo", &self.setinfo);
        push_iobytes(&mut out, "break", &self.oplock_break);
        out
    }
}

/// The three counter sections, as found at the top level of a capture and
/// inside each extended (per share and client) entry.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ProfileSections {
    #[serde(rename = "SMBD loop")]
    pub smbd_loop: Option<SmbdLoop>,
    #[serde(rename = "System Calls")]
    pub system_calls: Option<SystemCalls>,
    #[serde(rename = "SMB2 Calls")]
    pub smb2_calls: Option<Smb2Calls>,
}

impl ProfileSections {
    pub fn is_empty(&self) -> bool {
        self.smbd_loop.is_none() && self.system_calls.is_none() && self.smb2_calls.is_none()
    }
}

/// A complete profiling capture.
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct ProfileSnapshot {
    pub timestamp: String,
    pub version: String,
    pub smb_conf: String,
    #[serde(flatten)]
    pub sections: ProfileSections,
    /// Per share and client counters, keyed `<share>:[<client address>]` as
    /// emitted on the wire. Decode keys with
    /// [`crate::parser::json::split_extended_key`].
    #[serde(rename = "Extended Profile")]
    pub extended: BTreeMap<String, ProfileSections>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accessors_by_shape() {
        let basic = ProfileCounters::Basic(BasicCounter { count: 3, time: 9 });
        assert_eq!(basic.count(), 3);
        assert_eq!(basic.time(), 9);
        assert_eq!(basic.idle(), None);
        assert_eq!(basic.bytes(), None);
        assert_eq!(basic.inbytes(), None);

        let io = ProfileCounters::IoBytes(IoBytesCounter {
            count: 1,
            time: 2,
            idle: 3,
            inbytes: 4,
            outbytes: 5,
        });
        assert_eq!(io.idle(), Some(3));
        assert_eq!(io.inbytes(), Some(4));
        assert_eq!(io.outbytes(), Some(5));
        assert_eq!(io.bytes(), None);
    }

    #[test]
    fn test_absent_counters_are_not_listed() {
        let calls = Smb2Calls {
            read: Some(IoBytesCounter::default()),
            ..Default::default()
        };
        let counters = calls.counters();
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].0, "read");
        assert_eq!(counters[0].1.count(), 0);
    }

    #[test]
    fn test_syscall_shapes() {
        let calls = SystemCalls {
            asys_pwrite: Some(BytesCounter {
                bytes: 42,
                ..Default::default()
            }),
            stat: Some(BasicCounter::default()),
            ..Default::default()
        };
        let counters = calls.counters();
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0].0, "asys_pwrite");
        assert_eq!(counters[0].1.bytes(), Some(42));
        assert_eq!(counters[1].0, "stat");
        assert_eq!(counters[1].1.bytes(), None);
    }
}
