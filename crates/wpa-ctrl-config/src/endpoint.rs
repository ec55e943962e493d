use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::defaults::CTRL_SEARCH_DIRECTORIES;

/// Declarative address of a supplicant control interface.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum CtrlEndpoint {
    /// Unix datagram socket, either a full path or a bare interface name.
    Unix {
        /// Socket path or interface name.
        path: Utf8PathBuf,
    },
    /// UDP control interface, as exposed by the supplicant on Windows builds.
    Udp {
        /// Host name or IP address.
        host: String,
        /// UDP port.
        port: u16,
    },
}

impl CtrlEndpoint {
    /// Builds a Unix datagram endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a UDP endpoint.
    #[must_use]
    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        Self::Udp {
            host: host.into(),
            port,
        }
    }

    /// Returns the configured Unix path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Udp { .. } => None,
        }
    }

    /// Lists the filesystem locations probed for a Unix control socket, in order.
    ///
    /// Relative paths (usually an interface name such as `wlan0`) are tried as
    /// given and then under each conventional supplicant run directory.
    /// Absolute paths are used verbatim. UDP endpoints have no candidates.
    #[must_use]
    pub fn search_candidates(&self) -> Vec<Utf8PathBuf> {
        let Some(path) = self.unix_path() else {
            return Vec::new();
        };
        let mut candidates = vec![path.to_path_buf()];
        if path.is_relative() {
            candidates.extend(
                CTRL_SEARCH_DIRECTORIES
                    .iter()
                    .map(|directory| Utf8Path::new(directory).join(path)),
            );
        }
        candidates
    }
}

impl fmt::Display for CtrlEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } if path.is_absolute() => write!(formatter, "unix://{path}"),
            Self::Unix { path } => write!(formatter, "{path}"),
            Self::Udp { host, port } => write!(formatter, "udp://{host}:{port}"),
        }
    }
}

impl FromStr for CtrlEndpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EndpointParseError::Empty);
        }
        if !trimmed.contains("://") {
            return Ok(Self::unix(trimmed));
        }

        let url = Url::parse(trimmed)?;
        match url.scheme() {
            "unix" => {
                let path = url.path();
                if path.is_empty() {
                    return Err(EndpointParseError::MissingUnixPath(input.to_owned()));
                }
                Ok(Self::unix(path))
            }
            "udp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| EndpointParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
                Ok(Self::udp(host, port))
            }
            other => Err(EndpointParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Errors encountered while parsing a [`CtrlEndpoint`] from text.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// No address was supplied.
    #[error("control interface address is empty")]
    Empty,
    /// Scheme was not recognised.
    #[error("unsupported control interface scheme '{0}'")]
    UnsupportedScheme(String),
    /// UDP host name was missing.
    #[error("missing UDP host in '{0}'")]
    MissingHost(String),
    /// UDP port was missing from the address.
    #[error("missing UDP port in '{0}'")]
    MissingPort(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
