//! Rendering of `smbstatus` aggregates as Prometheus gauges.
//!
//! Every scrape builds a fresh [`Registry`], so series that disappeared from
//! `smbstatus` (closed sessions, idle shares) vanish from the output instead
//! of reporting stale values.

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use smbmetrics_core::aggregate::{ProfileInfo, SmbInfo};
use smbmetrics_core::collector::{SmbStatusCollector, StatusCommand};
use smbmetrics_core::versions::Versions;

use crate::error::ExporterError;

const NAMESPACE: &str = "smb";
const PROFILE_LABELS: &[&str] = &["section", "operation", "share", "client"];

/// Collects and renders one metrics exposition per call.
pub struct SmbMetrics<C: StatusCommand> {
    collector: SmbStatusCollector<C>,
    versions: Versions,
    versions_ok: bool,
    profile: bool,
}

impl<C: StatusCommand> SmbMetrics<C> {
    /// `versions_ok` is reported as the `smb_metrics_status` value (0 when
    /// every version resolved, 1 otherwise).
    pub fn new(collector: SmbStatusCollector<C>, versions: Versions, versions_ok: bool) -> Self {
        Self {
            collector,
            versions,
            versions_ok,
            profile: true,
        }
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    /// Runs `smbstatus` and renders the result in Prometheus text format.
    ///
    /// Blocks on subprocess execution.
    pub fn render(&self) -> Result<String, ExporterError> {
        let registry = Registry::new();

        self.register_versions(&registry)?;

        let info = SmbInfo::collect(&self.collector);
        register_activity(&registry, &info)?;
        register_shares(&registry, &info)?;

        if self.profile {
            let profile = ProfileInfo::collect(&self.collector);
            debug!(entries = profile.entries().len(), "collected profile counters");
            register_profile(&registry, &profile)?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExporterError::Encoding(e.to_string()))
    }

    fn register_versions(&self, registry: &Registry) -> Result<(), ExporterError> {
        let status = GaugeVec::new(
            Opts::new("status", "Current metrics-collector status versions")
                .namespace(NAMESPACE)
                .subsystem("metrics"),
            &["version", "commitid", "sambavers", "ctdbvers"],
        )?;
        status
            .with_label_values(&[
                self.versions.version.as_str(),
                self.versions.commit_id.as_str(),
                self.versions.samba_version.as_str(),
                self.versions.ctdb_version.as_str(),
            ])
            .set(if self.versions_ok { 0.0 } else { 1.0 });
        registry.register(Box::new(status))?;
        Ok(())
    }
}

fn gauge(
    registry: &Registry,
    subsystem: &str,
    name: &str,
    help: &str,
    value: usize,
) -> Result<(), ExporterError> {
    let g = Gauge::with_opts(
        Opts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem(subsystem),
    )?;
    g.set(value as f64);
    registry.register(Box::new(g))?;
    Ok(())
}

fn register_activity(registry: &Registry, info: &SmbInfo) -> Result<(), ExporterError> {
    gauge(
        registry,
        "sessions",
        "total",
        "Number of currently active SMB sessions",
        info.total_sessions(),
    )?;
    gauge(
        registry,
        "tcon",
        "total",
        "Number of currently active SMB tree-connections",
        info.total_tree_cons(),
    )?;
    gauge(
        registry,
        "users",
        "total",
        "Number of currently active SMB users",
        info.total_connected_users(),
    )?;
    gauge(
        registry,
        "openfiles",
        "total",
        "Number of currently open files",
        info.total_open_files(),
    )?;
    gauge(
        registry,
        "openfiles",
        "access_rw",
        "Number of open files with read-write access mode",
        info.total_open_files_access_rw(),
    )?;
    Ok(())
}

fn register_shares(registry: &Registry, info: &SmbInfo) -> Result<(), ExporterError> {
    let activity = GaugeVec::new(
        Opts::new("activity", "Number of remote machines currently using a share")
            .namespace(NAMESPACE)
            .subsystem("share"),
        &["service"],
    )?;
    for (service, machines) in info.map_service_to_machines() {
        activity
            .with_label_values(&[service.as_str()])
            .set(machines.len() as f64);
    }

    let byremote = GaugeVec::new(
        Opts::new("byremote", "Number of shares served for remote machine")
            .namespace(NAMESPACE)
            .subsystem("share"),
        &["machine"],
    )?;
    for (machine, services) in info.map_machine_to_services() {
        byremote
            .with_label_values(&[machine.as_str()])
            .set(services.len() as f64);
    }

    registry.register(Box::new(activity))?;
    registry.register(Box::new(byremote))?;
    Ok(())
}

fn profile_vec(name: &str, help: &str) -> Result<GaugeVec, ExporterError> {
    Ok(GaugeVec::new(
        Opts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem("profile"),
        PROFILE_LABELS,
    )?)
}

fn register_profile(registry: &Registry, profile: &ProfileInfo) -> Result<(), ExporterError> {
    let count = profile_vec("count", "Number of calls per operation")?;
    let time = profile_vec("time_microseconds", "Time spent per operation")?;
    let idle = profile_vec("idle_microseconds", "Idle time per operation")?;
    let bytes = profile_vec("bytes", "Bytes transferred per system call")?;
    let inbytes = profile_vec("inbytes", "Request bytes received per SMB2 operation")?;
    let outbytes = profile_vec("outbytes", "Response bytes sent per SMB2 operation")?;

    for entry in profile.entries() {
        let labels = [
            entry.section.as_str(),
            entry.operation,
            entry.share.as_deref().unwrap_or(""),
            entry.client.as_deref().unwrap_or(""),
        ];
        let c = &entry.counters;

        count.with_label_values(&labels).set(c.count() as f64);
        time.with_label_values(&labels).set(c.time() as f64);
        if let Some(v) = c.idle() {
            idle.with_label_values(&labels).set(v as f64);
        }
        if let Some(v) = c.bytes() {
            bytes.with_label_values(&labels).set(v as f64);
        }
        if let Some(v) = c.inbytes() {
            inbytes.with_label_values(&labels).set(v as f64);
        }
        if let Some(v) = c.outbytes() {
            outbytes.with_label_values(&labels).set(v as f64);
        }
    }

    for family in [count, time, idle, bytes, inbytes, outbytes] {
        registry.register(Box::new(family))?;
    }
    Ok(())
}
