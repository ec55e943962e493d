//! Error types for control socket transports.

use std::fmt;
use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Step of a send-then-receive exchange that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStage {
    /// Writing the command datagram.
    Send,
    /// Reading the reply datagram.
    Receive,
}

impl fmt::Display for ExchangeStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => formatter.write_str("send"),
            Self::Receive => formatter.write_str("read"),
        }
    }
}

/// Errors surfaced while connecting to, or talking over, a control socket.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No control socket exists at any searched location.
    #[error("control socket '{address}' not found (searched {searched})")]
    NotFound {
        /// Address as configured.
        address: String,
        /// Comma separated list of probed paths.
        searched: String,
    },
    /// Every local endpoint slot is taken.
    #[error("reached max socket file limit: all {capacity} local endpoints under {directory} are in use")]
    PoolExhausted {
        /// Directory holding the local endpoints.
        directory: Utf8PathBuf,
        /// Pool size.
        capacity: usize,
    },
    /// The UDP host name did not resolve.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Address being resolved.
        endpoint: String,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },
    /// Creating or binding the local endpoint failed.
    #[error("failed to bind local endpoint {address}: {source}")]
    Bind {
        /// Local address being bound.
        address: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Connecting the datagram socket to the daemon failed.
    #[error("dial failed for {endpoint}: {source}")]
    Connect {
        /// Daemon address.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Writing to the socket failed.
    #[error("write to socket failed: {source}")]
    Send {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The socket accepted fewer bytes than requested.
    #[error("short write: {written} of {expected} bytes accepted")]
    ShortWrite {
        /// Bytes accepted.
        written: usize,
        /// Bytes requested.
        expected: usize,
    },
    /// Reading from the socket failed.
    #[error("read from socket failed: {source}")]
    Receive {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The transport has been closed.
    #[error("use of closed control socket")]
    Closed,
    /// Releasing the socket or its local endpoint failed.
    #[error("failed to close control socket: {source}")]
    Close {
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// One half of a command round trip failed.
    #[error("{stage} failed: {source}")]
    Exchange {
        /// Failing step.
        stage: ExchangeStage,
        /// Error raised by that step.
        #[source]
        source: Box<TransportError>,
    },
    /// Unix control sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("unix control sockets are unsupported on this platform: {endpoint}")]
    UnsupportedUnix {
        /// Rejected address.
        endpoint: String,
    },
}

impl TransportError {
    pub(crate) fn exchange(stage: ExchangeStage, source: Self) -> Self {
        Self::Exchange {
            stage,
            source: Box::new(source),
        }
    }

    /// Returns `true` when the error means the connection is gone for good:
    /// it was closed locally, or the peer vanished.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Receive { source } | Self::Send { source } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::BrokenPipe
            ),
            Self::Exchange { source, .. } => source.is_disconnect(),
            _ => false,
        }
    }
}
