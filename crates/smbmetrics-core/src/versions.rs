//! Build and runtime version information, used to label exported metrics.

use tracing::debug;

use crate::collector::{CollectError, run_command};

/// Environment variable holding the name of the pod running Samba.
pub const POD_NAME_ENV: &str = "SAMBA_POD_NAME";
/// Environment variable holding the namespace of the pod running Samba.
pub const POD_NAMESPACE_ENV: &str = "SAMBA_POD_NAMESPACE";

/// Versions of this exporter and of the Samba packages it reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub version: String,
    pub commit_id: String,
    pub samba_version: String,
    pub ctdb_version: String,
}

impl Default for Versions {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit_id: env!("SMBMETRICS_COMMIT_ID").to_string(),
            samba_version: String::new(),
            ctdb_version: String::new(),
        }
    }
}

impl Versions {
    /// Build-time defaults plus package versions queried from `rpm`.
    ///
    /// Resolution is best-effort: package versions that cannot be queried are
    /// left empty and their errors returned alongside.
    pub fn resolve() -> (Self, Vec<CollectError>) {
        Self::resolve_with(|package| run_command("rpm", &["-q", package]))
    }

    /// Like [`Versions::resolve`], with a custom package query.
    pub fn resolve_with<F>(query: F) -> (Self, Vec<CollectError>)
    where
        F: Fn(&str) -> Result<String, CollectError>,
    {
        let mut vers = Self::default();
        let mut errors = Vec::new();

        for (package, slot) in [
            ("samba", &mut vers.samba_version),
            ("ctdb", &mut vers.ctdb_version),
        ] {
            match query(package) {
                Ok(v) => *slot = v,
                Err(e) => {
                    debug!(package, error = %e, "failed to resolve package version");
                    errors.push(e);
                }
            }
        }

        (vers, errors)
    }
}

/// Identity of the pod this exporter runs in, when deployed on Kubernetes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodIdentity {
    pub name: String,
    pub namespace: String,
}

impl PodIdentity {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            name: lookup(POD_NAME_ENV).unwrap_or_default(),
            namespace: lookup(POD_NAMESPACE_ENV).unwrap_or_default(),
        }
    }

    pub fn is_known(&self) -> bool {
        !self.name.is_empty()
    }
}
