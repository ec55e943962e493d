//! Integration tests for the `wpactl` binary entry point.
//!
//! Covers user-facing error handling and a full round trip against a fake
//! supplicant.

use assert_cmd::cargo::cargo_bin_cmd;
use camino::Utf8PathBuf;
use predicates::str::contains;
use wpa_ctrl::test_support::FakeDaemon;

#[test]
fn missing_operation_exits_with_failure() {
    let mut command = cargo_bin_cmd!("wpactl");
    command
        .assert()
        .failure()
        .stderr(contains("Usage"));
}

#[test]
fn unknown_output_format_is_rejected() {
    let mut command = cargo_bin_cmd!("wpactl");
    command.args(["--output", "yaml", "ping"]);
    command
        .assert()
        .failure()
        .stderr(contains("invalid value 'yaml'"));
}

#[test]
fn unreachable_interface_reports_connection_failure() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut command = cargo_bin_cmd!("wpactl");
    command
        .env("WPACTL_LOCAL_SOCKET_DIR", dir.path())
        .arg("--ctrl-interface")
        .arg(dir.path().join("absent"))
        .arg("ping");
    command
        .assert()
        .failure()
        .stderr(contains("failed to connect to"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn networks_are_listed_as_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| anyhow::anyhow!("non-utf8 temp dir: {}", path.display()))?;
    let daemon = FakeDaemon::spawn(root.join("wlan0"))?;

    let mut command = cargo_bin_cmd!("wpactl");
    command
        .env("WPACTL_LOCAL_SOCKET_DIR", root.as_str())
        .args(["--ctrl-interface", daemon.path().as_str(), "networks"]);
    command.assert().success().stdout(contains("[]"));
    assert_eq!(daemon.request_count("LIST_NETWORKS"), 1);
    Ok(())
}
