//! StrataCache CLI: inspect and verify snapshot directories.
//!
//! ```text
//! stratacache runs <path>                      list runs and their state
//! stratacache show <fingerprint> <path>        print a run's metadata record
//! stratacache verify <fingerprint> <path>      read back every shard
//! stratacache init-config                      print a config template
//! ```
//!
//! `--config FILE` supplies the path and prefixes from a snapshot config;
//! `--json` switches to machine-readable output.

mod commands;
mod format;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::ArgMatches;
use stratacache_core::{Fingerprint, SnapshotConfig};
use stratacache_durability::{MetadataStore, ShardReader, SnapshotPaths};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_record, format_runs, format_verify, OutputMode};

/// Exit code when verification finds damaged data.
const EXIT_CORRUPT: i32 = 2;

fn main() {
    let matches = build_cli().get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    init_tracing(matches.get_flag("verbose"));

    let exit_code = match run(&matches, output_mode) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            1
        }
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "stratacache=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(matches: &ArgMatches, mode: OutputMode) -> anyhow::Result<i32> {
    match matches.subcommand() {
        Some(("runs", sub)) => {
            let config = resolve_config(matches, sub)?;
            let runs = MetadataStore::from_config(&config)
                .list_runs()
                .with_context(|| format!("listing runs under {}", config.path.display()))?;
            println!("{}", format_runs(&runs, mode));
            Ok(0)
        }
        Some(("show", sub)) => {
            let config = resolve_config(matches, sub)?;
            let fingerprint = parse_fingerprint(sub)?;
            let record = MetadataStore::from_config(&config)
                .load(&fingerprint)?
                .with_context(|| format!("no readable metadata for run {}", fingerprint))?;
            println!("{}", format_record(&record, mode));
            Ok(0)
        }
        Some(("verify", sub)) => {
            let mut config = resolve_config(matches, sub)?;
            if let Some(prefix) = sub.get_one::<String>("reader-prefix") {
                config.reader_path_prefix = PathBuf::from(prefix);
            }
            verify(&config, &parse_fingerprint(sub)?, mode)
        }
        Some(("init-config", _)) => {
            print!("{}", SnapshotConfig::default_toml());
            Ok(0)
        }
        _ => bail!("unknown command"),
    }
}

fn verify(config: &SnapshotConfig, fingerprint: &Fingerprint, mode: OutputMode) -> anyhow::Result<i32> {
    let record = MetadataStore::from_config(config)
        .load(fingerprint)?
        .with_context(|| format!("no readable metadata for run {}", fingerprint))?;
    if !record.is_done() {
        bail!("run {} is still being written", fingerprint);
    }

    let dir = SnapshotPaths::from_config(config).reader_shard_dir(fingerprint, &record.owner);
    let reader = ShardReader::open(&dir, record.shards().to_vec())?;
    match reader.verify() {
        Ok(report) => {
            println!("{}", format_verify(fingerprint, &report, mode));
            Ok(0)
        }
        Err(e) if e.is_corruption() => {
            let err = anyhow::Error::new(e).context(format!("run {} is corrupt", fingerprint));
            eprintln!("{}", format_error(&err, mode));
            Ok(EXIT_CORRUPT)
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the snapshot config from `--config` and/or the positional path.
fn resolve_config(matches: &ArgMatches, sub: &ArgMatches) -> anyhow::Result<SnapshotConfig> {
    let from_file = match matches.get_one::<String>("config") {
        Some(file) => Some(
            SnapshotConfig::load(Path::new(file))
                .with_context(|| format!("loading config {}", file))?,
        ),
        None => None,
    };
    let path = sub.get_one::<String>("path").map(PathBuf::from);
    let config = match (from_file, path) {
        (Some(config), Some(path)) => SnapshotConfig { path, ..config },
        (Some(config), None) => config,
        (None, Some(path)) => SnapshotConfig::new(path),
        (None, None) => bail!("no snapshot path given; pass PATH or --config"),
    };
    debug!(
        target: "stratacache::cli",
        path = %config.path.display(),
        reader_root = %config.reader_root().display(),
        "Resolved snapshot config"
    );
    Ok(config)
}

fn parse_fingerprint(sub: &ArgMatches) -> anyhow::Result<Fingerprint> {
    let raw = sub
        .get_one::<String>("fingerprint")
        .context("missing fingerprint")?;
    Fingerprint::parse(raw).with_context(|| format!("invalid fingerprint '{}'", raw))
}
