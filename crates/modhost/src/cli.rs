//! Command-line interface handling for the mod host.
//!
//! This module provides command-line argument parsing using the `clap`
//! crate's builder API.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Every option except `config` overrides the matching configuration file
/// setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the mods directory
    pub mods_dir: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Exit right after loading instead of waiting for a shutdown signal
    pub once: bool,
}

/// Builds the clap command describing the host's options.
pub fn command() -> Command {
    Command::new("modhost")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Loads mods from a directory and runs them through their lifecycle")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("modhost.toml"),
        )
        .arg(
            Arg::new("mods")
                .short('m')
                .long("mods")
                .value_name("DIR")
                .help("Mods directory path"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Exit after loading instead of waiting for Ctrl+C")
                .action(clap::ArgAction::SetTrue),
        )
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("modhost.toml")),
            mods_dir: matches.get_one::<String>("mods").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            once: matches.get_flag("once"),
        }
    }
}
