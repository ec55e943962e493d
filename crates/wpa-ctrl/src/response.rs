//! Classification of textual command replies.

use crate::commands::PING;
use crate::error::CtrlError;

/// Classified result of a command reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command succeeded; carries the raw reply.
    Success(Vec<u8>),
    /// The daemon does not know the command.
    UnknownCommand,
    /// The daemon reported `FAIL`, or the liveness reply was not `PONG`.
    CommandFailed {
        /// Extra detail when the failure was inferred locally.
        context: Option<String>,
    },
    /// The daemon rejected the arguments. `detail` is empty when the reply
    /// was a usage dump.
    InvalidCommand {
        /// Command name as issued.
        command: String,
        /// Normalised explanation from the daemon.
        detail: String,
    },
}

impl Outcome {
    /// Converts the outcome into the executor's result type.
    pub fn into_result(self) -> Result<Vec<u8>, CtrlError> {
        match self {
            Self::Success(reply) => Ok(reply),
            Self::UnknownCommand => Err(CtrlError::UnknownCommand),
            Self::CommandFailed { context } => Err(CtrlError::CommandFailed { context }),
            Self::InvalidCommand { command, detail } => {
                Err(CtrlError::InvalidCommand { command, detail })
            }
        }
    }

    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Maps the reply to `command` onto an [`Outcome`].
///
/// Literal `UNKNOWN COMMAND` and `FAIL` replies are checked first, then the
/// `Invalid <COMMAND> command` and usage dump prefixes, and finally the
/// `PONG` check for `PING`.
#[must_use]
pub fn classify(command: &str, reply: &[u8]) -> Outcome {
    let decoded = String::from_utf8_lossy(reply);
    let text = decoded.strip_suffix('\n').unwrap_or(&*decoded);

    if text == "UNKNOWN COMMAND" {
        return Outcome::UnknownCommand;
    }
    if text == "FAIL" {
        return Outcome::CommandFailed { context: None };
    }

    let invalid_prefix = format!("Invalid {command} command");
    if let Some(rest) = text.strip_prefix(invalid_prefix.as_str()) {
        return Outcome::InvalidCommand {
            command: command.to_owned(),
            detail: normalise_detail(rest),
        };
    }

    let usage_prefix = command.to_ascii_lowercase();
    if !usage_prefix.is_empty() && text.starts_with(usage_prefix.as_str()) {
        return Outcome::InvalidCommand {
            command: command.to_owned(),
            detail: String::new(),
        };
    }

    if command == PING && text != "PONG" {
        return Outcome::CommandFailed {
            context: Some(format!("expected PONG got {text}")),
        };
    }

    Outcome::Success(reply.to_vec())
}

fn normalise_detail(rest: &str) -> String {
    let detail = rest
        .find(|character: char| character.is_ascii_lowercase())
        .and_then(|start| rest.get(start..))
        .unwrap_or(rest);
    detail.replace('\n', " ")
}
