//! Command-line runtime for `wpactl`.
//!
//! The module owns argument parsing, configuration bootstrapping, telemetry
//! set-up and the single control operation each invocation performs. The
//! runtime is exercised both from the binary entrypoint and from tests where
//! configuration loading and IO streams are substituted.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use wpa_ctrl::Client;
use wpa_ctrl::commands::PING;

mod cli;
mod config;
mod errors;
pub mod output;
mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigArgumentSplit, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
pub use output::{OutputFormat, ResolvedOutputFormat};

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `wpa_ctrl_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--ctrl-interface",
    "--local-socket-dir",
    "--endpoint-pool-size",
    "--scan-timeout-ms",
    "--log-filter",
    "--log-format",
];

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
    stdout_is_terminal: bool,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(
        stdout: &'a mut W,
        stderr: &'a mut E,
        stdout_is_terminal: bool,
    ) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal,
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E, stdout_is_terminal: bool) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr, stdout_is_terminal);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    match try_run(args, io, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io.stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn try_run<I, W, E, L>(args: I, io: &mut IoStreams<'_, W, E>, loader: &L) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = match Cli::try_parse_from(prepare_cli_arguments(&args, &split)) {
        Ok(cli) => cli,
        // Help and version requests are rendered on stdout and succeed.
        Err(error) if !error.use_stderr() => {
            return write!(io.stdout, "{error}").map_err(AppError::WriteOutput);
        }
        Err(error) => return Err(AppError::CliUsage(error)),
    };

    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;

    let format = cli.output.resolve(io.stdout_is_terminal);
    let client = Client::connect(&config).map_err(|source| AppError::Connect {
        endpoint: config.ctrl_interface.clone(),
        source,
    })?;
    debug!(
        target: CLI_TARGET,
        operation = cli.command.name(),
        endpoint = %config.ctrl_interface,
        "running operation"
    );

    let outcome = execute(&client, &cli.command, io.stdout, format);
    let closed = client.close().map_err(AppError::Close);
    outcome.and(closed)
}

fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    let mut cli_arguments: Vec<OsString> = args.first().cloned().into_iter().collect();
    if let Some(rest) = args.get(split.command_start..) {
        cli_arguments.extend(rest.iter().cloned());
    }
    cli_arguments
}

fn execute<W: Write>(
    client: &Client,
    operation: &CliCommand,
    stdout: &mut W,
    format: ResolvedOutputFormat,
) -> Result<(), AppError> {
    match operation {
        CliCommand::Ping => {
            client.ping().map_err(AppError::operation("ping"))?;
            output::write_reply(stdout, format, PING, b"PONG")
        }
        CliCommand::Exec { command, arguments } => {
            let words: Vec<&str> = arguments.iter().map(String::as_str).collect();
            let reply = client
                .execute(command, &words)
                .map_err(AppError::operation("exec"))?;
            output::write_reply(stdout, format, command, &reply)
        }
        CliCommand::Listen { events, count } => listen(client, events, *count, stdout, format),
        CliCommand::Scan => {
            let access_points = client.scan().map_err(AppError::operation("scan"))?;
            output::write_access_points(stdout, format, &access_points)
        }
        CliCommand::Networks => {
            let networks = client
                .list_networks()
                .map_err(AppError::operation("networks"))?;
            output::write_networks(stdout, format, &networks)
        }
    }
}

/// Prints events until `count` have arrived or the stream ends.
fn listen<W: Write>(
    client: &Client,
    events: &[String],
    count: Option<usize>,
    stdout: &mut W,
    format: ResolvedOutputFormat,
) -> Result<(), AppError> {
    let stream = client
        .notify(events.iter().cloned())
        .map_err(AppError::operation("listen"))?;
    let limit = count.unwrap_or(usize::MAX);
    let written = stream
        .iter()
        .take(limit)
        .try_for_each(|event| output::write_event(stdout, format, &event));
    client.stop(&stream);
    written
}
