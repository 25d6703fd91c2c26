//! Abstraction over running `smbstatus`, so collectors can be tested without
//! a Samba installation.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::parser::ParseError;

/// Known install locations of `smbstatus`, searched in order.
pub const SMBSTATUS_PATHS: &[&str] = &[
    "/usr/bin/smbstatus",
    "/usr/local/bin/smbstatus",
    "/usr/local/samba/bin/smbstatus",
];

/// Errors from invoking `smbstatus` or reading its output.
#[derive(Debug)]
pub enum CollectError {
    /// No usable `smbstatus` executable.
    NotFound(String),
    /// Launch failure or non-zero exit.
    Command(String),
    /// Output could not be parsed.
    Parse(ParseError),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::NotFound(what) => write!(f, "executable not found: {}", what),
            CollectError::Command(msg) => write!(f, "command failed: {}", msg),
            CollectError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<ParseError> for CollectError {
    fn from(e: ParseError) -> Self {
        CollectError::Parse(e)
    }
}

/// Runs `smbstatus` with the given arguments and returns its trimmed stdout.
pub trait StatusCommand: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, CollectError>;
}

/// The real `smbstatus` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbStatusCommand {
    path: PathBuf,
}

impl SmbStatusCommand {
    /// Finds `smbstatus` in its known install locations.
    pub fn locate() -> Result<Self, CollectError> {
        locate_in(SMBSTATUS_PATHS.iter().map(Path::new))
            .map(|path| Self { path })
            .ok_or_else(|| CollectError::NotFound(SMBSTATUS_PATHS.join(", ")))
    }

    /// Uses an explicit path, which must be an executable regular file.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, CollectError> {
        let path = path.into();
        if !is_executable(&path) {
            return Err(CollectError::NotFound(path.display().to_string()));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusCommand for SmbStatusCommand {
    fn run(&self, args: &[&str]) -> Result<String, CollectError> {
        run_command(&self.path, args)
    }
}

fn locate_in<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .find(|p| is_executable(p))
        .map(Path::to_path_buf)
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Runs `program` to completion and returns its trimmed stdout.
///
/// A non-zero exit is an error carrying the exit status and stderr.
pub fn run_command(program: impl AsRef<Path>, args: &[&str]) -> Result<String, CollectError> {
    let program = program.as_ref();
    debug!(program = %program.display(), ?args, "running command");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| CollectError::Command(format!("{}: {}", program.display(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CollectError::Command(format!(
            "{} {}: {}: {}",
            program.display(),
            args.join(" "),
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
