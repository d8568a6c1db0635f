//! Clap command tree definition.

use clap::{Arg, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("stratacache")
        .about("Inspect and verify StrataCache snapshot directories")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Snapshot config file (TOML); supplies the path and prefixes")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log snapshot activity to stderr")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_runs())
        .subcommand(build_show())
        .subcommand(build_verify())
        .subcommand(build_init_config())
}

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Snapshot root directory (defaults to the config file's path)")
        .required(false)
}

fn build_runs() -> Command {
    Command::new("runs")
        .about("List runs under a snapshot root")
        .arg(path_arg())
}

fn build_show() -> Command {
    Command::new("show")
        .about("Print the metadata record of a run")
        .arg(
            Arg::new("fingerprint")
                .help("Run fingerprint (32 hex characters)")
                .required(true),
        )
        .arg(path_arg())
}

fn build_verify() -> Command {
    Command::new("verify")
        .about("Read every shard of a finished run and check its integrity")
        .arg(
            Arg::new("fingerprint")
                .help("Run fingerprint (32 hex characters)")
                .required(true),
        )
        .arg(path_arg())
        .arg(
            Arg::new("reader-prefix")
                .long("reader-prefix")
                .help("Prefix applied to shard paths when reading"),
        )
}

fn build_init_config() -> Command {
    Command::new("init-config").about("Print a commented config file template")
}
