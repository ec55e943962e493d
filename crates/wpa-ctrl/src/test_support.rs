//! In-process stand-in for the supplicant's control socket.
//!
//! [`FakeDaemon`] binds a Unix datagram socket and answers the commands the
//! client issues with the same texts the real daemon produces. It also
//! understands `EVENTS`, which is not a supplicant command: it replies `OK`
//! and pushes a fixed burst of events to every attached client.

use std::collections::HashMap;
use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use wpa_ctrl_config::CtrlEndpoint;

use crate::commands::{
    ADD_NETWORK, ATTACH, DETACH, EVENT_AVOID_FREQ, EVENT_BEACON_LOSS, EVENT_BSS_ADDED,
    EVENT_CHANNEL_SWITCH, EVENT_CONNECTED, EVENT_DISCONNECTED, EVENT_EAP_FAILURE,
    EVENT_EAP_NOTIFICATION, EVENT_NETWORK_NOT_FOUND, EVENT_PASSWORD_CHANGED, EVENT_SCAN_RESULTS,
    EVENT_SCAN_STARTED, LIST_NETWORKS, PING, REMOVE_NETWORK, SCAN, SCAN_RESULTS, SET_NETWORK,
    WPS_EVENT_AP_AVAILABLE,
};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::fake_daemon");
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const EVENT_PACING: Duration = Duration::from_millis(2);

/// Command that makes the fake daemon emit [`EVENT_BURST`].
pub const EVENTS_TRIGGER: &str = "EVENTS";

/// Events pushed, at severity 2, in reply to [`EVENTS_TRIGGER`].
pub const EVENT_BURST: [&str; 11] = [
    EVENT_AVOID_FREQ,
    EVENT_BEACON_LOSS,
    EVENT_BSS_ADDED,
    EVENT_BSS_ADDED,
    EVENT_CHANNEL_SWITCH,
    EVENT_CONNECTED,
    EVENT_DISCONNECTED,
    EVENT_EAP_FAILURE,
    EVENT_EAP_NOTIFICATION,
    EVENT_NETWORK_NOT_FOUND,
    EVENT_PASSWORD_CHANGED,
];

/// Events pushed, at severity 3, after `SCAN`.
pub const SCAN_EVENTS: [&str; 3] = [EVENT_SCAN_STARTED, EVENT_SCAN_RESULTS, WPS_EVENT_AP_AVAILABLE];

/// Header line of `SCAN_RESULTS`.
pub const SCAN_HEADER: &str = "bssid / frequency / signal level / flags / ssid";

/// Rows returned by `SCAN_RESULTS` once a scan has run.
pub const SCAN_ROWS: [&str; 3] = [
    "d0:7a:b5:31:23:a0\t2472\t-30\t[WPA2-PSK-CCMP][WPS][ESS]\tAP0",
    "00:1f:1f:37:42:d9\t2442\t-37\t[WPA2-PSK-CCMP][ESS]\tAP1",
    "24:00:ba:f8:65:df\t2412\t-77\t[WPA-PSK-CCMP+TKIP][WPA2-PSK-CCMP+TKIP][WPS][ESS]\tAP2",
];

/// Header line of `LIST_NETWORKS`.
pub const NETWORK_HEADER: &str = "network id / ssid / bssid / flags";

/// Reply to `SET_NETWORK` without arguments.
pub const SET_NETWORK_USAGE: &str = "set_network variables:
\tssid (network name, SSID)
\tpsk (WPA passphrase or pre-shared key)
\tkey_mgmt (key management protocol)
\tidentity (EAP identity)
\tpassword (EAP password)
\t...

Note: Values are entered in the same format as the configuration file is using,
i.e., strings values need to be inside double quotation marks.
For example: set_network 1 ssid \"network name\"";

/// Reply to `SET_NETWORK` with the wrong arguments.
pub const SET_NETWORK_INVALID: &str =
    "Invalid SET_NETWORK command: needs three arguments\n(network id, variable name, and value)";

/// Reply to `REMOVE_NETWORK` without arguments.
pub const REMOVE_NETWORK_INVALID: &str =
    "Invalid REMOVE_NETWORK command - at least 1 argument is required.";

struct FakeNetwork {
    id: u32,
    ssid: String,
    bssid: String,
    flags: Vec<String>,
}

#[derive(Default)]
struct DaemonState {
    overrides: HashMap<String, String>,
    subscribers: Vec<PathBuf>,
    networks: Vec<FakeNetwork>,
    next_network: u32,
    scanned: bool,
    silent_scan: bool,
    requests: Vec<String>,
}

/// Reply and follow-up events produced for one request.
struct Response {
    reply: Option<String>,
    events: Vec<(u8, &'static str)>,
}

impl Response {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            events: Vec::new(),
        }
    }
}

/// Fake supplicant bound to a Unix datagram socket.
///
/// The socket file is removed and the worker thread joined on drop.
pub struct FakeDaemon {
    path: Utf8PathBuf,
    socket: Arc<UnixDatagram>,
    state: Arc<Mutex<DaemonState>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FakeDaemon {
    /// Binds the daemon socket at `path` and starts answering requests.
    pub fn spawn(socket_path: impl Into<Utf8PathBuf>) -> io::Result<Self> {
        let path = socket_path.into();
        let socket = Arc::new(UnixDatagram::bind(path.as_std_path())?);
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let state = Arc::new(Mutex::new(DaemonState::default()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = {
            let worker_socket = Arc::clone(&socket);
            let worker_state = Arc::clone(&state);
            let worker_shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("fake-wpa-supplicant".to_owned())
                .spawn(move || serve(&worker_socket, &worker_state, &worker_shutdown))?
        };

        Ok(Self {
            path,
            socket,
            state,
            shutdown,
            worker: Some(worker),
        })
    }

    /// Path of the daemon socket.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Endpoint a client connects to.
    #[must_use]
    pub fn endpoint(&self) -> CtrlEndpoint {
        CtrlEndpoint::unix(self.path.clone())
    }

    /// Answers `command` with `reply` until cleared.
    pub fn set_reply(&self, command: &str, reply: &str) {
        self.state()
            .overrides
            .insert(command.to_owned(), reply.to_owned());
    }

    /// Restores the built-in handling of `command`.
    pub fn clear_reply(&self, command: &str) {
        self.state().overrides.remove(command);
    }

    /// When set, `SCAN` succeeds without emitting any event.
    pub fn set_silent_scan(&self, silent: bool) {
        self.state().silent_scan = silent;
    }

    /// Pretends a scan already ran, so `SCAN_RESULTS` lists access points.
    pub fn set_scanned(&self, scanned: bool) {
        self.state().scanned = scanned;
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    /// Number of requests whose command word is `command`.
    #[must_use]
    pub fn request_count(&self, command: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|request| request.split(' ').next() == Some(command))
            .count()
    }

    /// Number of attached client sockets.
    #[must_use]
    pub fn attached_clients(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Sends `<severity>message\n` to every attached client and returns how
    /// many were addressed.
    pub fn push_event(&self, severity: u8, message: &str) -> usize {
        self.push_raw(format!("<{severity}>{message}\n").as_bytes())
    }

    /// Sends `frame` verbatim to every attached client.
    pub fn push_raw(&self, frame: &[u8]) -> usize {
        let subscribers = self.state().subscribers.clone();
        for subscriber in &subscribers {
            send(&self.socket, frame, subscriber);
        }
        subscribers.len()
    }

    fn state(&self) -> MutexGuard<'_, DaemonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                debug!(target: TARGET, "fake daemon worker panicked");
            }
        }
        if let Err(error) = std::fs::remove_file(self.path.as_std_path()) {
            debug!(target: TARGET, %error, "failed to remove fake daemon socket");
        }
    }
}

fn serve(socket: &UnixDatagram, state: &Mutex<DaemonState>, shutdown: &AtomicBool) {
    let mut buffer = [0_u8; 4096];
    while !shutdown.load(Ordering::Acquire) {
        let (read, peer) = match socket.recv_from(&mut buffer) {
            Ok(received) => received,
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(error) => {
                debug!(target: TARGET, %error, "fake daemon stopped");
                return;
            }
        };
        let Some(peer) = peer.as_pathname().map(Path::to_path_buf) else {
            continue;
        };
        let request = String::from_utf8_lossy(buffer.get(..read).unwrap_or_default()).into_owned();

        let (response, subscribers) = {
            let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
            let response = handle(&mut guard, &request, &peer);
            (response, guard.subscribers.clone())
        };

        if let Some(reply) = response.reply {
            send(socket, format!("{reply}\n").as_bytes(), &peer);
        }
        for (severity, message) in response.events {
            let frame = format!("<{severity}>{message}\n");
            for subscriber in &subscribers {
                send(socket, frame.as_bytes(), subscriber);
            }
            thread::sleep(EVENT_PACING);
        }
    }
}

fn handle(state: &mut DaemonState, request: &str, peer: &Path) -> Response {
    state.requests.push(request.to_owned());
    let mut words = request.split(' ');
    let command = words.next().unwrap_or_default();
    let args: Vec<&str> = words.filter(|word| !word.is_empty()).collect();

    if let Some(reply) = state.overrides.get(command) {
        return Response::reply(reply.clone());
    }

    match command {
        PING => Response::reply("PONG"),
        ATTACH => {
            if !state.subscribers.iter().any(|known| known == peer) {
                state.subscribers.push(peer.to_path_buf());
            }
            Response::reply("OK")
        }
        DETACH => {
            let before = state.subscribers.len();
            state.subscribers.retain(|known| known != peer);
            Response::reply(if state.subscribers.len() < before { "OK" } else { "FAIL" })
        }
        EVENTS_TRIGGER => Response {
            reply: Some("OK".to_owned()),
            events: EVENT_BURST.iter().map(|message| (2, *message)).collect(),
        },
        SCAN => {
            state.scanned = true;
            Response {
                reply: Some("OK".to_owned()),
                events: if state.silent_scan {
                    Vec::new()
                } else {
                    SCAN_EVENTS.iter().map(|message| (3, *message)).collect()
                },
            }
        }
        SCAN_RESULTS => {
            let mut lines = vec![SCAN_HEADER];
            if state.scanned {
                lines.extend(SCAN_ROWS);
            }
            Response::reply(lines.join("\n"))
        }
        ADD_NETWORK => {
            let id = state.next_network;
            state.next_network += 1;
            state.networks.push(FakeNetwork {
                id,
                ssid: String::new(),
                bssid: "any".to_owned(),
                flags: vec!["DISABLED".to_owned()],
            });
            Response::reply(id.to_string())
        }
        REMOVE_NETWORK => remove_network(state, &args),
        SET_NETWORK => set_network(state, &args),
        LIST_NETWORKS => {
            let mut listing = NETWORK_HEADER.to_owned();
            for network in &state.networks {
                listing.push_str(&format!(
                    "\n{}\t{}\t{}\t[{}]",
                    network.id,
                    network.ssid,
                    network.bssid,
                    network.flags.join("][")
                ));
            }
            Response::reply(listing)
        }
        _ => Response::reply("UNKNOWN COMMAND"),
    }
}

fn remove_network(state: &mut DaemonState, args: &[&str]) -> Response {
    let Some(raw_id) = args.first() else {
        return Response::reply(REMOVE_NETWORK_INVALID);
    };
    let Ok(id) = raw_id.parse::<u32>() else {
        return Response::reply("FAIL");
    };
    let before = state.networks.len();
    state.networks.retain(|network| network.id != id);
    Response::reply(if state.networks.len() < before { "OK" } else { "FAIL" })
}

fn set_network(state: &mut DaemonState, args: &[&str]) -> Response {
    let [raw_id, variable, value] = args else {
        return Response::reply(if args.is_empty() {
            SET_NETWORK_USAGE
        } else {
            SET_NETWORK_INVALID
        });
    };
    let Ok(id) = raw_id.parse::<u32>() else {
        return Response::reply(SET_NETWORK_INVALID);
    };
    if *variable != "ssid" {
        return Response::reply(SET_NETWORK_INVALID);
    }
    match state.networks.iter_mut().find(|network| network.id == id) {
        Some(network) => {
            network.ssid = value.trim_matches('"').to_owned();
            Response::reply("OK")
        }
        None => Response::reply("FAIL"),
    }
}

fn send(socket: &UnixDatagram, frame: &[u8], peer: &Path) {
    if let Err(error) = socket.send_to(frame, peer) {
        debug!(target: TARGET, peer = %peer.display(), %error, "fake daemon write failed");
    }
}
