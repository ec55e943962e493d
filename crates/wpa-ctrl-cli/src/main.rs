//! Entrypoint for `wpactl`.
//!
//! The binary delegates to [`wpa_ctrl_cli::run`], which loads configuration,
//! initialises telemetry, runs one operation against the supplicant and
//! renders the outcome.

use std::io::{self, IsTerminal, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdout_is_terminal = io::stdout().is_terminal();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    wpa_ctrl_cli::run(
        std::env::args_os(),
        &mut stdout,
        &mut stderr,
        stdout_is_terminal,
    )
}
