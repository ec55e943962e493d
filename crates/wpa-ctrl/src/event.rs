//! Decoding of unsolicited event frames.
//!
//! Frames look like `<3>CTRL-EVENT-CONNECTED - Connection to ...\n`: a
//! single severity digit in angle brackets, the message, and a newline.

use std::num::ParseIntError;

use serde::Serialize;
use thiserror::Error;

use crate::commands::CTRL_REQ;

const MIN_FRAME_LEN: usize = 5;
const PREFIX_LEN: usize = 3;

/// Credential prompt carried by a `CTRL-REQ-` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthRequest {
    /// Network the daemon needs credentials for.
    pub network_id: u32,
    /// Requested field, such as `PASSWORD` or `OTP`.
    pub kind: String,
    /// Human readable prompt.
    pub text: String,
}

/// Why a frame could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The frame is shorter than the smallest valid event.
    #[error("message too short: {frame}")]
    TooShort {
        /// Frame as received, lossily decoded.
        frame: String,
    },
    /// The severity slot does not hold a decimal digit.
    #[error("invalid severity level '{found}'")]
    Severity {
        /// Character found in the severity slot.
        found: char,
    },
    /// A `CTRL-REQ-` message lacks its `-` or `:` separator.
    #[error("malformed credential request: {message}")]
    MalformedAuthRequest {
        /// Message after the request marker.
        message: String,
    },
    /// The network id of a `CTRL-REQ-` message is not an integer.
    #[error("parse networkID '{value}': {source}")]
    NetworkId {
        /// Text found where the id was expected.
        value: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },
    /// The event socket failed while reading.
    #[error("event receive failed: {message}")]
    Receive {
        /// Rendered transport error.
        message: String,
    },
}

/// One asynchronous status notification from the daemon.
///
/// An event with [`Event::error`] set stands for a frame that could not be
/// decoded; its other fields carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Severity level, `0` through `9`.
    pub severity: u8,
    /// Event text without the severity prefix or trailing newline.
    pub message: String,
    /// Structured payload of credential requests.
    pub auth_request: Option<AuthRequest>,
    /// Decode failure, for malformed frames.
    pub error: Option<EventError>,
}

impl Event {
    /// Decodes one frame. Malformed frames produce an error event rather
    /// than a failure so the caller's stream keeps flowing.
    #[must_use]
    pub fn parse(frame: &[u8]) -> Self {
        decode(frame).unwrap_or_else(Self::failed)
    }

    /// Builds an event that carries only `error`.
    #[must_use]
    pub fn failed(error: EventError) -> Self {
        Self {
            severity: 0,
            message: String::new(),
            auth_request: None,
            error: Some(error),
        }
    }

    /// Returns `true` when this event reports a decode or receive failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn decode(frame: &[u8]) -> Result<Event, EventError> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(EventError::TooShort {
            frame: String::from_utf8_lossy(frame).into_owned(),
        });
    }

    let level = frame.get(1).copied().unwrap_or_default();
    if !level.is_ascii_digit() {
        return Err(EventError::Severity {
            found: char::from(level),
        });
    }
    let severity = level - b'0';

    let body = String::from_utf8_lossy(frame.get(PREFIX_LEN..).unwrap_or_default());
    let message = body.strip_suffix('\n').unwrap_or(&body);

    match message.strip_prefix(CTRL_REQ) {
        Some(request) => Ok(Event {
            severity,
            message: CTRL_REQ.to_owned(),
            auth_request: Some(parse_auth_request(request)?),
            error: None,
        }),
        None => Ok(Event {
            severity,
            message: message.to_owned(),
            auth_request: None,
            error: None,
        }),
    }
}

fn parse_auth_request(request: &str) -> Result<AuthRequest, EventError> {
    let malformed = || EventError::MalformedAuthRequest {
        message: request.to_owned(),
    };
    let (kind, rest) = request.split_once('-').ok_or_else(malformed)?;
    let (id, text) = rest.split_once(':').ok_or_else(malformed)?;
    let network_id = id.parse().map_err(|source| EventError::NetworkId {
        value: id.to_owned(),
        source,
    })?;

    Ok(AuthRequest {
        network_id,
        kind: kind.to_owned(),
        text: text.to_owned(),
    })
}
