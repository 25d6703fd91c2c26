//! Derived totals and groupings over one status capture.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::collector::{SmbStatusCollector, StatusCommand};
use crate::model::{Session, SmbStatus, TreeCon};

/// Read-only view over an [`SmbStatus`] capture.
///
/// Connections to `IPC$` never show up in tree-connection totals or
/// groupings. Every method is infallible; a failed collection yields an
/// empty view that reports zeros.
#[derive(Debug, Clone, Default)]
pub struct SmbInfo {
    status: SmbStatus,
}

impl SmbInfo {
    pub fn new(status: SmbStatus) -> Self {
        Self { status }
    }

    /// Captures fresh status, falling back to an empty view on failure.
    pub fn collect<C: StatusCommand>(collector: &SmbStatusCollector<C>) -> Self {
        match collector.status() {
            Ok(status) => Self::new(status),
            Err(e) => {
                warn!(error = %e, "failed to collect smbstatus, reporting empty status");
                Self::default()
            }
        }
    }

    pub fn status(&self) -> &SmbStatus {
        &self.status
    }

    pub fn total_sessions(&self) -> usize {
        self.status.sessions.len()
    }

    pub fn total_tree_cons(&self) -> usize {
        self.tree_cons().count()
    }

    /// Number of distinct non-empty usernames across sessions.
    pub fn total_connected_users(&self) -> usize {
        self.status
            .sessions
            .values()
            .map(|s| s.username.as_str())
            .filter(|u| !u.is_empty())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Open files of either schema revision.
    pub fn total_open_files(&self) -> usize {
        self.status.open_files.len() + self.status.locked_files.len()
    }

    /// Number of opens holding both read and write data access.
    pub fn total_open_files_access_rw(&self) -> usize {
        self.status
            .list_open_files()
            .into_iter()
            .flat_map(|f| f.opens.values())
            .filter(|o| o.access_mask.is_read_write())
            .count()
    }

    /// Tree connections excluding `IPC$`.
    pub fn list_tree_cons(&self) -> Vec<&TreeCon> {
        self.tree_cons().collect()
    }

    /// service -> machine -> number of tree connections.
    pub fn map_service_to_machines(&self) -> BTreeMap<String, BTreeMap<String, usize>> {
        let mut ret: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for tcon in self.tree_cons() {
            *ret.entry(tcon.service.clone())
                .or_default()
                .entry(tcon.machine.clone())
                .or_default() += 1;
        }
        ret
    }

    /// machine -> service -> number of tree connections.
    pub fn map_machine_to_services(&self) -> BTreeMap<String, BTreeMap<String, usize>> {
        let mut ret: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for tcon in self.tree_cons() {
            *ret.entry(tcon.machine.clone())
                .or_default()
                .entry(tcon.service.clone())
                .or_default() += 1;
        }
        ret
    }

    pub fn map_machine_to_sessions(&self) -> BTreeMap<String, Vec<&Session>> {
        let mut ret: BTreeMap<String, Vec<&Session>> = BTreeMap::new();
        for session in self.status.sessions.values() {
            ret.entry(session.remote_machine.clone())
                .or_default()
                .push(session);
        }
        ret
    }

    pub fn map_service_to_tree_cons(&self) -> BTreeMap<String, Vec<&TreeCon>> {
        let mut ret: BTreeMap<String, Vec<&TreeCon>> = BTreeMap::new();
        for tcon in self.tree_cons() {
            ret.entry(tcon.service.clone()).or_default().push(tcon);
        }
        ret
    }

    pub fn map_machine_to_tree_cons(&self) -> BTreeMap<String, Vec<&TreeCon>> {
        let mut ret: BTreeMap<String, Vec<&TreeCon>> = BTreeMap::new();
        for tcon in self.tree_cons() {
            ret.entry(tcon.machine.clone()).or_default().push(tcon);
        }
        ret
    }

    fn tree_cons(&self) -> impl Iterator<Item = &TreeCon> {
        self.status.tcons.values().filter(|t| !t.is_ipc())
    }
}
