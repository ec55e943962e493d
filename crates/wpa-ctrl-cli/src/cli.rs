//! CLI argument definitions for `wpactl`.

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Command-line interface for the wpa_supplicant control client.
#[derive(Parser, Debug)]
#[command(name = "wpactl", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Controls how results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub(crate) output: OutputFormat,
    /// The operation to run against the supplicant.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations understood by `wpactl`.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Checks that the supplicant answers `PING`.
    Ping,
    /// Sends a raw control command and prints the reply.
    Exec {
        /// Command name, for example `STATUS`.
        #[arg(value_name = "COMMAND")]
        command: String,
        /// Arguments appended to the command, separated by spaces.
        #[arg(
            value_name = "ARG",
            num_args = 0..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        arguments: Vec<String>,
    },
    /// Subscribes to unsolicited events and prints them as they arrive.
    Listen {
        /// Event messages to keep, matched exactly. Every event is printed
        /// when none are given.
        #[arg(value_name = "EVENT")]
        events: Vec<String>,
        /// Stops after this many events.
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },
    /// Scans for access points and prints the results.
    Scan,
    /// Lists the configured networks.
    Networks,
}

impl CliCommand {
    /// Short name used in logs.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Exec { .. } => "exec",
            Self::Listen { .. } => "listen",
            Self::Scan => "scan",
            Self::Networks => "networks",
        }
    }
}
