//! Normalized data model for `smbstatus` captures.
//!
//! - [`status`]: sessions, tree connections and open files (`SmbStatus`)
//! - [`profile`]: smbd profiling counters (`ProfileSnapshot`)
//! - [`records`]: rows of the legacy text output
//!
//! A capture lives only for one scrape: it is built from a single parse,
//! optionally merged with captures of other categories, read by the
//! aggregators and dropped.

mod de;
mod profile;
mod records;
mod status;

pub use profile::{
    BasicCounter, BytesCounter, IoBytesCounter, ProfileCounters, ProfileSections, ProfileSnapshot,
    Smb2Calls, SmbdLoop, SystemCalls,
};
pub use records::{LockRecord, ProcRecord, ShareRecord, open_files_from_locks};
pub use status::{
    AccessMask, Caching, Channel, CryptoInfo, FileId, IPC_SERVICE, Lease, OpLock, OpenFile,
    OpenInfo, ServerId, Session, ShareMode, SmbStatus, TreeCon,
};
