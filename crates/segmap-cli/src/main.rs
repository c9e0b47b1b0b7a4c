//! segmap: segment placement map generator.
//!
//! Computes where every primary and mirror segment of a cluster lives and
//! writes the result as an initialization manifest, or as an expansion
//! manifest for host groups added to a running cluster.

mod config;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use segmap_core::{build_plan, render, split_dir_list, ConfigError, Mode, PlanRequest};
use tracing::info;

use crate::config::SegmapConfig;

/// Exit status for rejected placement requests.
const EXIT_CONFIG_ERROR: u8 = 3;

/// Generate segment placement maps for cluster initialization and expansion.
///
/// Primaries default to /data1/primary and /data2/primary, mirrors to
/// /data1/mirror and /data2/mirror. The map is written to stdout unless
/// --outfile is given.
#[derive(Parser)]
#[command(name = "segmap", version, about)]
struct Args {
    /// path to TOML configuration file
    #[arg(short = 'c', long, env = "SEGMAP_CONFIG")]
    config: Option<PathBuf>,

    /// print default configuration as TOML and exit
    #[arg(long)]
    config_template: bool,

    /// number of segment hosts in the system
    #[arg(short = 's', long, env = "SEGMAP_SEGHOSTS")]
    seghosts: Option<usize>,

    /// number of segments per host
    #[arg(short = 'd', long, env = "SEGMAP_SEGDBS")]
    segdbs: Option<usize>,

    /// colon-separated list of primary segment directories
    #[arg(short = 'p', long, env = "SEGMAP_PRIMARYDIRS")]
    primarydirs: Option<String>,

    /// colon-separated list of mirror segment directories
    #[arg(short = 'm', long, env = "SEGMAP_MIRRORDIRS")]
    mirrordirs: Option<String>,

    /// output file. defaults to stdout
    #[arg(short = 'o', long, env = "SEGMAP_OUTFILE")]
    outfile: Option<PathBuf>,

    /// generate a map for system initialization
    #[arg(short = 'i', long)]
    initsystem: bool,

    /// generate a map for system expansion
    #[arg(short = 'e', long)]
    expansion: bool,

    /// number of segment hosts added during expansion
    #[arg(short = 'a', long, env = "SEGMAP_ADDED")]
    added: Option<usize>,

    /// largest content id in the existing system
    #[arg(short = 'C', long, env = "SEGMAP_MAXCONTENT")]
    maxcontent: Option<u32>,

    /// largest dbid in the existing system
    #[arg(short = 'D', long, env = "SEGMAP_MAXDBID")]
    maxdbid: Option<u32>,

    /// host name prefix. hosts are named <prefix>1, <prefix>2, ...
    #[arg(long, env = "SEGMAP_HOST_PREFIX")]
    host_prefix: Option<String>,
}

/// Applies CLI overrides to a `SegmapConfig`. Only `Some` values take
/// effect, so a flag or env var beats the file, which beats the defaults.
fn apply_args(cfg: &mut SegmapConfig, args: &Args) {
    if let Some(ref dirs) = args.primarydirs {
        cfg.primary_dirs = Some(split_dir_list(dirs));
    }
    if let Some(ref dirs) = args.mirrordirs {
        cfg.mirror_dirs = Some(split_dir_list(dirs));
    }
    if let Some(ref prefix) = args.host_prefix {
        cfg.host_prefix = prefix.clone();
    }
}

/// Assembles the placement request, checking flag-level rules in the
/// order the planner documents them.
fn build_request(cfg: &SegmapConfig, args: &Args) -> Result<PlanRequest, ConfigError> {
    let (Some(host_count), Some(segments)) = (args.seghosts, args.segdbs) else {
        return Err(ConfigError::MissingCounts);
    };
    if cfg.primary_dirs.is_some() != cfg.mirror_dirs.is_some() {
        return Err(ConfigError::UnpairedDirectories);
    }
    let mode = Mode::from_flags(
        args.initsystem,
        args.expansion,
        args.added,
        args.maxcontent,
        args.maxdbid,
    )?;

    let mut request = PlanRequest::new(host_count, segments, mode)
        .with_ports(cfg.port_layout())
        .with_host_prefix(cfg.host_prefix.clone());
    request.primary_dirs = cfg.primary_dirs.clone();
    request.mirror_dirs = cfg.mirror_dirs.clone();
    Ok(request)
}

/// Writes the manifest to the output file, or stdout when none is given.
fn write_manifest(outfile: Option<&Path>, manifest: &str) -> io::Result<()> {
    match outfile {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(manifest.as_bytes())?;
            file.sync_all()
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(manifest.as_bytes())?;
            stdout.flush()
        }
    }
}

fn report(msg: impl std::fmt::Display) {
    eprintln!("{}", format!("error: {msg}").red());
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segmap=info".into()),
        )
        .init();

    let args = Args::parse();

    if args.config_template {
        return match SegmapConfig::default().to_toml() {
            Ok(toml) => {
                print!("{toml}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                report(e);
                ExitCode::FAILURE
            }
        };
    }

    // defaults → TOML file → env vars / CLI flags
    let mut cfg = match args.config {
        Some(ref path) => match SegmapConfig::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                report(e);
                return ExitCode::FAILURE;
            }
        },
        None => SegmapConfig::default(),
    };
    apply_args(&mut cfg, &args);

    let plan = match build_request(&cfg, &args).and_then(|request| build_plan(&request)) {
        Ok(plan) => plan,
        Err(e) => {
            report(e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let manifest = render(&plan, &cfg.preamble());
    if let Err(e) = write_manifest(args.outfile.as_deref(), &manifest) {
        match args.outfile {
            Some(ref path) => report(format!("failed to write '{}': {e}", path.display())),
            None => report(format!("failed to write manifest: {e}")),
        }
        return ExitCode::FAILURE;
    }

    let mode = if plan.mode().is_expansion() {
        "expansion"
    } else {
        "init"
    };
    info!(
        mode,
        hosts = plan.host_count(),
        segments = plan.segment_count(),
        next_dbid = plan.next_dbid(),
        next_content = plan.next_content(),
        "segment map written"
    );
    ExitCode::SUCCESS
}
