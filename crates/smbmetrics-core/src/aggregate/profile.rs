//! Flattening of profiling captures into per-operation entries.

use std::fmt;

use tracing::{debug, warn};

use crate::collector::{SmbStatusCollector, StatusCommand};
use crate::model::{ProfileCounters, ProfileSections, ProfileSnapshot};
use crate::parser::json::split_extended_key;

/// Counter section an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileSection {
    Loop,
    SystemCall,
    Smb2Call,
}

impl ProfileSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSection::Loop => "smbd_loop",
            ProfileSection::SystemCall => "syscall",
            ProfileSection::Smb2Call => "smb2",
        }
    }
}

impl fmt::Display for ProfileSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One counter of one operation.
///
/// `share` and `client` are set only for entries from the extended
/// (per share and client) part of the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub section: ProfileSection,
    pub operation: &'static str,
    pub counters: ProfileCounters,
    pub share: Option<String>,
    pub client: Option<String>,
}

/// Flat view over a [`ProfileSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct ProfileInfo {
    entries: Vec<ProfileEntry>,
}

impl ProfileInfo {
    pub fn new(snapshot: &ProfileSnapshot) -> Self {
        let mut entries = Vec::new();
        push_sections(&mut entries, &snapshot.sections, None);

        for (key, sections) in &snapshot.extended {
            let (share, client) = split_extended_key(key);
            if share.is_empty() {
                debug!(key = %key, "skipping undecodable extended profile key");
                continue;
            }
            push_sections(&mut entries, sections, Some((share, client)));
        }

        Self { entries }
    }

    /// Captures fresh counters, falling back to no entries on failure.
    pub fn collect<C: StatusCommand>(collector: &SmbStatusCollector<C>) -> Self {
        match collector.profile() {
            Ok(snapshot) => Self::new(&snapshot),
            Err(e) => {
                warn!(error = %e, "failed to collect smbstatus profile");
                Self::default()
            }
        }
    }

    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of `section` matching `operation`, top-level and extended alike.
    pub fn find<'a>(
        &'a self,
        section: ProfileSection,
        operation: &'a str,
    ) -> impl Iterator<Item = &'a ProfileEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.section == section && e.operation == operation)
    }
}

fn push_sections(
    out: &mut Vec<ProfileEntry>,
    sections: &ProfileSections,
    origin: Option<(&str, &str)>,
) {
    let mut push = |section: ProfileSection, counters: Vec<(&'static str, ProfileCounters)>| {
        out.extend(counters.into_iter().map(|(operation, counters)| ProfileEntry {
            section,
            operation,
            counters,
            share: origin.map(|(s, _)| s.to_string()),
            client: origin.map(|(_, c)| c.to_string()),
        }));
    };

    if let Some(smbd_loop) = &sections.smbd_loop {
        push(ProfileSection::Loop, smbd_loop.counters());
    }
    if let Some(system_calls) = &sections.system_calls {
        push(ProfileSection::SystemCall, system_calls.counters());
    }
    if let Some(smb2_calls) = &sections.smb2_calls {
        push(ProfileSection::Smb2Call, smb2_calls.counters());
    }
}
