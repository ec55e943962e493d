//! Errors returned by client operations.

use std::io;
use std::time::Duration;

use thiserror::Error;
use wpa_ctrl_config::EndpointParseError;

use crate::network::DecodeError;
use crate::transport::TransportError;

/// Failure of a client operation.
#[derive(Debug, Error)]
pub enum CtrlError {
    /// The transport failed; surfaced unmodified.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The configured control interface address is malformed.
    #[error("invalid control interface address: {0}")]
    Endpoint(#[from] EndpointParseError),
    /// The daemon replied `UNKNOWN COMMAND`.
    #[error("unknown command")]
    UnknownCommand,
    /// The daemon replied `FAIL`, or an expected reply did not arrive.
    #[error("command failed{}", context_suffix(.context.as_deref()))]
    CommandFailed {
        /// Detail added by the client, if any.
        context: Option<String>,
    },
    /// The daemon rejected the command's arguments.
    #[error("invalid {command} command{}", context_suffix(Some(.detail.as_str())))]
    InvalidCommand {
        /// Command name as issued.
        command: String,
        /// Explanation from the daemon; empty for usage dumps.
        detail: String,
    },
    /// A bounded wait expired.
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// Operation that gave up.
        operation: &'static str,
        /// Length of the wait.
        after: Duration,
    },
    /// A tabular reply could not be decoded.
    #[error("failed to decode {command} reply: {source}")]
    Decode {
        /// Command whose reply was decoded.
        command: &'static str,
        /// Decoder failure.
        #[source]
        source: DecodeError,
    },
    /// A background thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: &'static str,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// One or more teardown steps failed. Every step was still attempted.
    #[error("close failed: {}", join_failures(.failures))]
    Teardown {
        /// Failures in the order they occurred.
        failures: Vec<CtrlError>,
    },
}

impl CtrlError {
    /// Returns `true` when the failure came from reply classification.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownCommand | Self::CommandFailed { .. } | Self::InvalidCommand { .. }
        )
    }
}

fn context_suffix(context: Option<&str>) -> String {
    match context {
        Some(text) if !text.is_empty() => format!(": {text}"),
        _ => String::new(),
    }
}

fn join_failures(failures: &[CtrlError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
