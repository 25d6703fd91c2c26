//! Parser for the legacy column-aligned output of `smbstatus`.
//!
//! Column widths differ between Samba releases, so offsets are not fixed:
//! they are discovered from the header line by searching for each known
//! column title, then every data row is sliced at those offsets.
//!
//! ```text
//! Service      pid     Machine       Connected at                     Encryption   Signing
//! ---------------------------------------------------------------------------------------------
//! share1       12345   192.168.1.10  Wed Jun 14 10:01:02 AM 2023 UTC  -            -
//! ```
//!
//! Malformed rows degrade to empty fields. The only error is output without
//! the expected header, i.e. nothing usable at all.

use super::ParseError;
use crate::model::{IPC_SERVICE, LockRecord, ProcRecord, ShareRecord};
use crate::util::parse_time;

/// How a field value is cut out of a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// First whitespace-delimited token at the column offset.
    Token,
    /// Trimmed text from the column offset to the next known column.
    Span,
    /// Trimmed text from the end of the previous column's token to the end
    /// of the line. For trailing columns whose rows are not aligned.
    Tail,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub title: &'static str,
    pub extract: Extract,
}

const fn token(title: &'static str) -> ColumnSpec {
    ColumnSpec {
        title,
        extract: Extract::Token,
    }
}

const fn span(title: &'static str) -> ColumnSpec {
    ColumnSpec {
        title,
        extract: Extract::Span,
    }
}

const fn tail(title: &'static str) -> ColumnSpec {
    ColumnSpec {
        title,
        extract: Extract::Tail,
    }
}

/// Layout of one table variant.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Leading title identifying the header line.
    pub header: &'static str,
    /// Known columns, in the order fields are returned.
    pub columns: &'static [ColumnSpec],
    /// Line printed instead of a table when there is nothing to report.
    pub empty_marker: Option<&'static str>,
}

/// `smbstatus -S`
pub const SHARES_TABLE: TableSpec = TableSpec {
    header: "Service",
    columns: &[
        token("Service"),
        token("pid"),
        token("Machine"),
        span("Connected at"),
        token("Encryption"),
        token("Signing"),
    ],
    empty_marker: None,
};

/// `smbstatus -p`
pub const PROCS_TABLE: TableSpec = TableSpec {
    header: "PID",
    columns: &[
        token("PID"),
        token("Username"),
        token("Group"),
        token("Machine"),
        token("Protocol Version"),
        token("Encryption"),
        token("Signing"),
    ],
    empty_marker: None,
};

/// `smbstatus -L`
///
/// Rows are only aligned up to `SharePath`. File names may contain spaces,
/// so `Name` takes the rest of the row, and the trailing timestamp is split
/// off by [`parse_locks`].
pub const LOCKS_TABLE: TableSpec = TableSpec {
    header: "Pid",
    columns: &[
        token("Pid"),
        token("User"),
        token("DenyMode"),
        token("Access"),
        token("R/W"),
        token("Oplock"),
        token("SharePath"),
        tail("Name"),
    ],
    empty_marker: Some("No locked files"),
};

const DASH_LINE_PREFIX: &str = "------";
const COMMENT_PREFIX: char = '#';

/// Raw field values of one data row, indexed like `TableSpec::columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row(Vec<String>);

impl Row {
    pub fn get(&self, idx: usize) -> &str {
        self.0.get(idx).map(String::as_str).unwrap_or("")
    }

    fn take(&mut self, idx: usize) -> String {
        self.0.get_mut(idx).map(std::mem::take).unwrap_or_default()
    }
}

/// Splits a table into rows according to `spec`.
///
/// The first header line fixes the column offsets. Once it is seen, every
/// later line is data, even one starting with the header title. Rows are
/// only read once both the header and the dash separator have been seen.
pub fn parse_table(data: &str, spec: &TableSpec) -> Result<Vec<Row>, ParseError> {
    let mut offsets: Option<Vec<Option<usize>>> = None;
    let mut has_dash_line = false;
    let mut empty = false;
    let mut rows = Vec::new();

    for line in data.lines() {
        let ln = line.trim();

        // Ignore empty and comment lines
        if ln.is_empty() || ln.starts_with(COMMENT_PREFIX) {
            continue;
        }
        if ln.starts_with(DASH_LINE_PREFIX) {
            has_dash_line = true;
            continue;
        }
        if offsets.is_none() {
            if ln.starts_with(spec.header) {
                offsets = Some(spec.columns.iter().map(|c| ln.find(c.title)).collect());
            } else if spec.empty_marker.is_some_and(|m| ln.starts_with(m)) {
                empty = true;
            }
            continue;
        }

        let Some(offsets) = offsets.as_deref() else {
            continue;
        };
        if !has_dash_line {
            continue;
        }
        rows.push(extract_row(ln, spec, offsets));
    }

    if offsets.is_none() && !empty {
        return Err(ParseError::new(format!(
            "no '{}' header line in output",
            spec.header
        )));
    }

    Ok(rows)
}

fn extract_row(line: &str, spec: &TableSpec, offsets: &[Option<usize>]) -> Row {
    let fields = spec
        .columns
        .iter()
        .zip(offsets)
        .enumerate()
        .map(|(idx, (col, offset))| {
            let Some(start) = *offset else {
                return String::new();
            };
            match col.extract {
                Extract::Token => first_token(line, start),
                Extract::Span => {
                    let end = next_offset(offsets, start).unwrap_or(line.len());
                    span_text(line, start, end)
                }
                Extract::Tail => {
                    let prev = idx.checked_sub(1).and_then(|i| offsets.get(i).copied().flatten());
                    let from = match prev {
                        Some(p) => token_end(line, p).unwrap_or(line.len()),
                        None => start,
                    };
                    span_text(line, from, line.len())
                }
            }
        })
        .collect();
    Row(fields)
}

fn first_token(line: &str, start: usize) -> String {
    line.get(start..)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("")
        .to_string()
}

/// Byte offset just past the first token at or after `start`.
fn token_end(line: &str, start: usize) -> Option<usize> {
    let rest = line.get(start..)?;
    let trimmed = rest.trim_start();
    let token = trimmed.split_whitespace().next()?;
    Some(start + (rest.len() - trimmed.len()) + token.len())
}

fn span_text(line: &str, start: usize, end: usize) -> String {
    let end = end.min(line.len());
    if start >= end {
        return String::new();
    }
    line.get(start..end).map(str::trim).unwrap_or("").to_string()
}

/// Smallest column offset to the right of `start`.
fn next_offset(offsets: &[Option<usize>], start: usize) -> Option<usize> {
    offsets.iter().flatten().copied().filter(|&o| o > start).min()
}

/// Number of tokens in an ANSI C timestamp (`Wed Jun 14 10:01:02 2023`).
const LOCK_TIME_TOKENS: usize = 5;

/// Splits the trailing lock timestamp off a `Name` cell.
///
/// When the tail does not end in a parseable timestamp, the whole cell is
/// the name.
fn split_lock_time(cell: &str) -> (String, String) {
    let cell = cell.trim();
    let mut start = cell.len();
    for _ in 0..LOCK_TIME_TOKENS {
        let head = cell[..start].trim_end();
        if head.is_empty() {
            return (cell.to_string(), String::new());
        }
        start = match head.rsplit_once(char::is_whitespace) {
            Some((_, last)) => head.len() - last.len(),
            None => 0,
        };
    }

    let time = &cell[start..];
    if parse_time(time).is_err() {
        return (cell.to_string(), String::new());
    }
    (cell[..start].trim_end().to_string(), time.to_string())
}

/// Parses `smbstatus -S`. Connections to `IPC$` are dropped.
pub fn parse_shares(data: &str) -> Result<Vec<ShareRecord>, ParseError> {
    let rows = parse_table(data, &SHARES_TABLE)?;
    Ok(rows
        .into_iter()
        .map(|mut row| ShareRecord {
            service: row.take(0),
            pid: row.take(1),
            machine: row.take(2),
            connected_at: row.take(3),
            encryption: row.take(4),
            signing: row.take(5),
        })
        .filter(|share| share.service != IPC_SERVICE)
        .collect())
}

/// Parses `smbstatus -p`.
pub fn parse_procs(data: &str) -> Result<Vec<ProcRecord>, ParseError> {
    let rows = parse_table(data, &PROCS_TABLE)?;
    Ok(rows
        .into_iter()
        .map(|mut row| ProcRecord {
            pid: row.take(0),
            username: row.take(1),
            group: row.take(2),
            machine: row.take(3),
            protocol_version: row.take(4),
            encryption: row.take(5),
            signing: row.take(6),
        })
        .collect())
}

/// Parses `smbstatus -L`.
pub fn parse_locks(data: &str) -> Result<Vec<LockRecord>, ParseError> {
    let rows = parse_table(data, &LOCKS_TABLE)?;
    Ok(rows
        .into_iter()
        .map(|mut row| {
            let (name, time) = split_lock_time(row.get(7));
            LockRecord {
                pid: row.take(0),
                user_id: row.take(1),
                deny_mode: row.take(2),
                access: row.take(3),
                rw: row.take(4),
                oplock: row.take(5),
                share_path: row.take(6),
                name,
                time,
            }
        })
        .collect())
}
