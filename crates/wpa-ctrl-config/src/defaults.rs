use camino::Utf8PathBuf;

/// Directories probed, in order, for a control socket given by interface name.
pub const CTRL_SEARCH_DIRECTORIES: &[&str] = &["/var/wpa_supplicant", "/var/run/wpa_supplicant"];

/// Default UDP port of the supplicant control interface on platforms without
/// Unix domain sockets.
pub const DEFAULT_UDP_PORT: u16 = 9878;

/// Default number of local endpoints a process may hold at once.
pub const DEFAULT_ENDPOINT_POOL_SIZE: usize = 3;

/// Default bounded wait for scan completion, in milliseconds.
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 2_000;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Directory that holds the client's local datagram endpoints.
#[must_use]
pub fn default_local_socket_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("/tmp")
}

/// Computes the default control interface address.
#[must_use]
pub fn default_ctrl_interface() -> String {
    default_ctrl_interface_inner()
}

#[cfg(unix)]
fn default_ctrl_interface_inner() -> String {
    String::from("wlan0")
}

#[cfg(not(unix))]
fn default_ctrl_interface_inner() -> String {
    format!("udp://127.0.0.1:{DEFAULT_UDP_PORT}")
}
