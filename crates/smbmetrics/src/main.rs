mod collectors;
mod error;
mod exporter;

use std::net::IpAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use smbmetrics_core::collector::{SmbStatusCollector, SmbStatusCommand};
use smbmetrics_core::versions::{PodIdentity, Versions};

use collectors::SmbMetrics;
use error::ExporterError;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(
    name = "smbmetrics",
    about = "Prometheus exporter for Samba smbstatus",
    version
)]
struct Args {
    /// Prometheus metrics-exporter port number.
    #[arg(long, default_value_t = exporter::DEFAULT_PORT, env = "SMBMETRICS_PORT")]
    port: u16,

    /// Prometheus metrics-exporter bind address. Listens on all IPv4 and IPv6 interfaces if not set.
    #[arg(long, env = "SMBMETRICS_ADDRESS")]
    address: Option<IpAddr>,

    /// Run without collecting profile information.
    #[arg(long)]
    no_profile: bool,

    /// Show versions info and exit.
    #[arg(long)]
    show_versions: bool,

    /// Path to the smbstatus executable. Searched in standard locations if not set.
    #[arg(long, env = "SMBMETRICS_SMBSTATUS", value_name = "PATH")]
    smbstatus: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["smbmetrics", "smbmetrics_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn show_versions_and_exit() -> ! {
    let (vers, _) = Versions::resolve();
    let progname = std::env::args().next().unwrap_or_default();
    println!("Progname: {}", progname);
    println!("Version: {}", vers.version);
    println!("CommitID: {}", vers.commit_id);
    println!("Arch: {}", std::env::consts::ARCH);
    println!("SambaVersion: {}", vers.samba_version);
    println!("CtdbVersion: {}", vers.ctdb_version);
    process::exit(0);
}

fn locate_smbstatus(path: Option<PathBuf>) -> Result<SmbStatusCommand, ExporterError> {
    let cmd = match path {
        Some(path) => SmbStatusCommand::at(path)?,
        None => SmbStatusCommand::locate()?,
    };
    Ok(cmd)
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    if args.show_versions {
        show_versions_and_exit();
    }

    init_logging(args.verbose, args.quiet);

    info!(
        progname = %std::env::args().next().unwrap_or_default(),
        version = env!("CARGO_PKG_VERSION"),
        "initializing smbmetrics"
    );

    let (vers, version_errors) = Versions::resolve();
    info!(
        version = %vers.version,
        commit_id = %vers.commit_id,
        samba = %vers.samba_version,
        ctdb = %vers.ctdb_version,
        "versions"
    );

    let pod = PodIdentity::from_env();
    if pod.is_known() {
        info!(name = %pod.name, namespace = %pod.namespace, "self pod");
    }

    let cmd = match locate_smbstatus(args.smbstatus.clone()) {
        Ok(cmd) => cmd,
        Err(e) => {
            error!(error = %e, "failed to locate smbstatus");
            process::exit(1);
        }
    };
    let collector = SmbStatusCollector::new(cmd);
    match collector.version() {
        Ok(ver) => info!(path = %collector.command().path().display(), version = %ver, "located smbstatus"),
        Err(e) => {
            error!(error = %e, "failed to run smbstatus");
            process::exit(1);
        }
    }

    if let Some(addr) = args.address {
        info!(%addr, "user supplied bind address");
    }

    let metrics = Arc::new(
        SmbMetrics::new(collector, vers, version_errors.is_empty()).with_profile(!args.no_profile),
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(exporter::serve(metrics, args.address, args.port)) {
        error!(error = %e, "metrics exporter stopped");
        process::exit(1);
    }
}
