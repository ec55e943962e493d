//! Crate-level tests: executor and state machine against mocked
//! transports, and end-to-end behaviour against the fake daemon.

mod behaviour;
mod executor;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use rstest::fixture;
use tempfile::TempDir;

use crate::client::Client;
use crate::test_support::FakeDaemon;
use crate::transport::{Connector, EndpointPool, Transport, TransportError};

pub(super) const WAIT: Duration = Duration::from_secs(2);

/// Connector handing out pre-built transports in order.
pub(super) struct StaticConnector {
    transports: Mutex<VecDeque<Arc<dyn Transport>>>,
}

impl StaticConnector {
    pub(super) fn new(transports: Vec<Arc<dyn Transport>>) -> Arc<Self> {
        Arc::new(Self {
            transports: Mutex::new(transports.into()),
        })
    }
}

impl Connector for StaticConnector {
    fn connect(&self) -> Result<Arc<dyn Transport>, TransportError> {
        self.transports
            .lock()
            .expect("connector lock")
            .pop_front()
            .ok_or_else(|| TransportError::PoolExhausted {
                directory: Utf8PathBuf::from("/nonexistent"),
                capacity: 0,
            })
    }
}

/// Temporary directory holding a fake daemon socket and the client pool.
pub(super) struct Sandbox {
    pub(super) daemon: FakeDaemon,
    pub(super) root: Utf8PathBuf,
    _dir: TempDir,
}

impl Sandbox {
    pub(super) fn pool(&self, capacity: usize) -> EndpointPool {
        EndpointPool::new(self.root.clone(), capacity)
    }

    pub(super) fn client(&self) -> Client {
        Client::connect_endpoint(self.daemon.endpoint(), self.pool(3)).expect("connect client")
    }

    /// Names of the client endpoint files currently in the pool directory.
    pub(super) fn local_endpoints(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.root.as_std_path())
            .expect("read sandbox")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("wpa_ctrl_"))
            .collect();
        names.sort();
        names
    }
}

#[fixture]
pub(super) fn sandbox() -> Sandbox {
    new_sandbox()
}

pub(super) fn new_sandbox() -> Sandbox {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
    let daemon = FakeDaemon::spawn(root.join("wlan0")).expect("spawn fake daemon");
    Sandbox {
        daemon,
        root,
        _dir: dir,
    }
}

/// Polls `check` until it holds or [`WAIT`] elapses.
pub(super) fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

/// Compares a payload handed to a mocked transport with `expected`.
pub(super) fn payload_is(payload: &[u8], expected: &str) -> bool {
    payload == expected.as_bytes()
}
