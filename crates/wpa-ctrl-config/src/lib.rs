//! Shared configuration for the wpa_supplicant control client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file, then `WPACTL_*` environment variables, then command-line
//! flags. The binary and the library agree on the same [`Config`] so a client
//! can be constructed directly from whatever the operator supplied.

mod defaults;
mod endpoint;
mod logging;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

pub use defaults::{
    CTRL_SEARCH_DIRECTORIES, DEFAULT_ENDPOINT_POOL_SIZE, DEFAULT_LOG_FILTER,
    DEFAULT_SCAN_TIMEOUT_MS, DEFAULT_UDP_PORT, default_ctrl_interface, default_local_socket_dir,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use endpoint::{CtrlEndpoint, EndpointParseError};
pub use logging::{LogFormat, LogFormatParseError};
pub use ortho_config::OrthoConfig;

/// Runtime configuration shared by the client library and `wpactl`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WPACTL")]
pub struct Config {
    /// Control interface address: an interface name, a socket path,
    /// `unix:///path`, or `udp://host:port`.
    #[ortho_config(default = defaults::default_ctrl_interface())]
    pub ctrl_interface: String,
    /// Directory holding the client's local datagram endpoints.
    #[ortho_config(default = defaults::default_local_socket_dir())]
    pub local_socket_dir: Utf8PathBuf,
    /// Number of local endpoints one process may hold concurrently.
    #[ortho_config(default = defaults::DEFAULT_ENDPOINT_POOL_SIZE)]
    pub endpoint_pool_size: usize,
    /// Upper bound on the wait for scan results, in milliseconds.
    #[ortho_config(default = defaults::DEFAULT_SCAN_TIMEOUT_MS)]
    pub scan_timeout_ms: u64,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ctrl_interface: default_ctrl_interface(),
            local_socket_dir: default_local_socket_dir(),
            endpoint_pool_size: DEFAULT_ENDPOINT_POOL_SIZE,
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Parses the configured control interface address.
    pub fn ctrl_endpoint(&self) -> Result<CtrlEndpoint, EndpointParseError> {
        self.ctrl_interface.parse()
    }

    /// Directory holding the client's local datagram endpoints.
    #[must_use]
    pub fn local_socket_dir(&self) -> &camino::Utf8Path {
        self.local_socket_dir.as_path()
    }

    /// Bounded wait used by the scan choreography.
    #[must_use]
    pub const fn scan_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.scan_timeout_ms)
    }

    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_to_an_endpoint() {
        let config = Config::default();
        let endpoint = config.ctrl_endpoint().expect("default address parses");
        #[cfg(unix)]
        assert_eq!(endpoint, CtrlEndpoint::unix("wlan0"));
        #[cfg(not(unix))]
        assert_eq!(endpoint, CtrlEndpoint::udp("127.0.0.1", DEFAULT_UDP_PORT));
    }

    #[test]
    fn scan_timeout_converts_milliseconds() {
        let config = Config {
            scan_timeout_ms: 250,
            ..Config::default()
        };
        assert_eq!(config.scan_timeout(), std::time::Duration::from_millis(250));
    }
}
