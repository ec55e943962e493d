//! `socket2` backed datagram transport.

use std::io::{self, Read};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use camino::Utf8PathBuf;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, warn};
use wpa_ctrl_config::CtrlEndpoint;

use super::pool::{EndpointPool, release_slot};
use super::{Connector, MAX_FRAME_LEN, TRANSPORT_TARGET, Transport, TransportError};

/// Connected datagram socket to the daemon.
///
/// Unix transports own a local endpoint allocated from an
/// [`EndpointPool`]; the file is removed when the transport closes.
#[derive(Debug)]
pub struct DatagramTransport {
    socket: Socket,
    peer: String,
    local_path: Option<Utf8PathBuf>,
    closed: AtomicBool,
}

impl DatagramTransport {
    /// Connects to `endpoint`, allocating a local endpoint from `pool` for
    /// Unix sockets.
    pub fn connect(endpoint: &CtrlEndpoint, pool: &EndpointPool) -> Result<Self, TransportError> {
        match endpoint {
            CtrlEndpoint::Unix { .. } => Self::connect_unix(endpoint, pool),
            CtrlEndpoint::Udp { host, port } => Self::connect_udp(host, *port),
        }
    }

    /// Address of the daemon socket this transport talks to.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Local endpoint path, for Unix transports.
    #[must_use]
    pub fn local_path(&self) -> Option<&camino::Utf8Path> {
        self.local_path.as_deref()
    }

    #[cfg(unix)]
    fn connect_unix(endpoint: &CtrlEndpoint, pool: &EndpointPool) -> Result<Self, TransportError> {
        let remote = locate(endpoint)?;
        let socket = Socket::new(Domain::UNIX, Type::DGRAM, None).map_err(|source| {
            TransportError::Bind {
                address: pool.directory().to_string(),
                source,
            }
        })?;
        let local_path = pool.bind_free_slot(&socket)?;

        let connected = SockAddr::unix(remote.as_std_path())
            .and_then(|address| socket.connect(&address));
        if let Err(source) = connected {
            if let Err(error) = release_slot(&local_path) {
                warn!(
                    target: TRANSPORT_TARGET,
                    path = %local_path,
                    %error,
                    "failed to release local endpoint after dial failure"
                );
            }
            return Err(TransportError::Connect {
                endpoint: remote.to_string(),
                source,
            });
        }

        debug!(
            target: TRANSPORT_TARGET,
            peer = %remote,
            local = %local_path,
            "connected unix control socket"
        );
        Ok(Self {
            socket,
            peer: remote.to_string(),
            local_path: Some(local_path),
            closed: AtomicBool::new(false),
        })
    }

    #[cfg(not(unix))]
    fn connect_unix(endpoint: &CtrlEndpoint, _pool: &EndpointPool) -> Result<Self, TransportError> {
        Err(TransportError::UnsupportedUnix {
            endpoint: endpoint.to_string(),
        })
    }

    fn connect_udp(host: &str, port: u16) -> Result<Self, TransportError> {
        let endpoint = format!("{host}:{port}");
        let addresses: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                endpoint: endpoint.clone(),
                source,
            })?
            .collect();

        let mut last_error = None;
        for address in addresses {
            match dial_udp(address) {
                Ok(socket) => {
                    debug!(
                        target: TRANSPORT_TARGET,
                        peer = %address,
                        "connected udp control socket"
                    );
                    return Ok(Self {
                        socket,
                        peer: address.to_string(),
                        local_path: None,
                        closed: AtomicBool::new(false),
                    });
                }
                Err(error) => last_error = Some(error),
            }
        }

        Err(TransportError::Connect {
            endpoint,
            source: last_error.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
            }),
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Transport for DatagramTransport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let written = self
            .socket
            .send(payload)
            .map_err(|source| TransportError::Send { source })?;
        if written != payload.len() {
            return Err(TransportError::ShortWrite {
                written,
                expected: payload.len(),
            });
        }
        Ok(())
    }

    fn receive(&self) -> Result<Vec<u8>, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut buffer = vec![0_u8; MAX_FRAME_LEN];
        let read = match (&self.socket).read(&mut buffer) {
            Ok(read) => read,
            Err(_) if self.is_closed() => return Err(TransportError::Closed),
            Err(source) => return Err(TransportError::Receive { source }),
        };
        if read == 0 && self.is_closed() {
            return Err(TransportError::Closed);
        }
        buffer.truncate(read);
        Ok(buffer)
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // Shutdown wakes a receiver blocked in `read`.
        let shutdown = match self.socket.shutdown(std::net::Shutdown::Both) {
            Err(error) if error.kind() != io::ErrorKind::NotConnected => Err(error),
            _ => Ok(()),
        };
        let released = self
            .local_path
            .as_deref()
            .map_or(Ok(()), release_slot);

        debug!(target: TRANSPORT_TARGET, peer = %self.peer, "closed control socket");
        shutdown
            .and(released)
            .map_err(|source| TransportError::Close { source })
    }
}

impl Drop for DatagramTransport {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(
                target: TRANSPORT_TARGET,
                peer = %self.peer,
                %error,
                "failed to release control socket on drop"
            );
        }
    }
}

/// [`Connector`] that opens [`DatagramTransport`]s to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct Dialer {
    endpoint: CtrlEndpoint,
    pool: EndpointPool,
}

impl Dialer {
    /// Creates a dialer for `endpoint` drawing local endpoints from `pool`.
    #[must_use]
    pub const fn new(endpoint: CtrlEndpoint, pool: EndpointPool) -> Self {
        Self { endpoint, pool }
    }

    /// Endpoint this dialer connects to.
    #[must_use]
    pub const fn endpoint(&self) -> &CtrlEndpoint {
        &self.endpoint
    }
}

impl Connector for Dialer {
    fn connect(&self) -> Result<Arc<dyn Transport>, TransportError> {
        let transport = DatagramTransport::connect(&self.endpoint, &self.pool)?;
        Ok(Arc::new(transport))
    }
}

#[cfg(unix)]
fn locate(endpoint: &CtrlEndpoint) -> Result<Utf8PathBuf, TransportError> {
    let candidates = endpoint.search_candidates();
    candidates
        .iter()
        .find(|candidate| !matches!(candidate.as_std_path().try_exists(), Ok(false)))
        .cloned()
        .ok_or_else(|| TransportError::NotFound {
            address: endpoint.to_string(),
            searched: candidates
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn dial_udp(address: SocketAddr) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(address), Type::DGRAM, Some(Protocol::UDP))?;
    let local: SocketAddr = if address.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    socket.bind(&local.into())?;
    socket.connect(&address.into())?;
    Ok(socket)
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::net::UnixDatagram;
    use std::thread;

    use camino::Utf8Path;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct Sandbox {
        _dir: TempDir,
        root: Utf8PathBuf,
        daemon: UnixDatagram,
        daemon_path: Utf8PathBuf,
    }

    impl Sandbox {
        fn pool(&self, capacity: usize) -> EndpointPool {
            EndpointPool::new(self.root.join("clients"), capacity)
        }

        fn endpoint(&self) -> CtrlEndpoint {
            CtrlEndpoint::unix(self.daemon_path.clone())
        }
    }

    #[fixture]
    fn sandbox() -> Sandbox {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        std::fs::create_dir(root.join("clients").as_std_path()).expect("client dir");
        let daemon_path = root.join("wlan0");
        let daemon = UnixDatagram::bind(daemon_path.as_std_path()).expect("bind daemon");
        Sandbox {
            _dir: dir,
            root,
            daemon,
            daemon_path,
        }
    }

    #[rstest]
    fn round_trips_one_frame(sandbox: Sandbox) {
        let transport =
            DatagramTransport::connect(&sandbox.endpoint(), &sandbox.pool(3)).expect("connect");
        let local = transport.local_path().expect("unix endpoint").to_owned();
        assert!(local.as_std_path().exists());

        transport.send(b"PING").expect("send");
        let mut buffer = [0_u8; 64];
        let (read, from) = sandbox.daemon.recv_from(&mut buffer).expect("daemon read");
        assert_eq!(&buffer[..read], b"PING");
        let reply_to = from.as_pathname().expect("named client").to_owned();
        sandbox
            .daemon
            .send_to(b"PONG\n", reply_to)
            .expect("daemon reply");

        assert_eq!(transport.receive().expect("receive"), b"PONG\n");
    }

    #[rstest]
    fn close_releases_local_endpoint_and_is_idempotent(sandbox: Sandbox) {
        let transport =
            DatagramTransport::connect(&sandbox.endpoint(), &sandbox.pool(3)).expect("connect");
        let local = transport.local_path().expect("unix endpoint").to_owned();

        transport.close().expect("first close");
        transport.close().expect("second close");

        assert!(!local.as_std_path().exists());
        assert!(matches!(transport.send(b"PING"), Err(TransportError::Closed)));
        assert!(matches!(transport.receive(), Err(TransportError::Closed)));
    }

    #[rstest]
    fn close_wakes_blocked_receiver(sandbox: Sandbox) {
        let transport = Arc::new(
            DatagramTransport::connect(&sandbox.endpoint(), &sandbox.pool(3)).expect("connect"),
        );
        let reader = Arc::clone(&transport);
        let handle = thread::spawn(move || reader.receive());
        thread::sleep(std::time::Duration::from_millis(50));

        transport.close().expect("close");
        let outcome = handle.join().expect("receiver thread");
        assert!(matches!(outcome, Err(TransportError::Closed)));
    }

    #[rstest]
    fn pool_exhaustion_is_reported_after_capacity_connections(sandbox: Sandbox) {
        let pool = sandbox.pool(3);
        let held: Vec<_> = (0..3)
            .map(|_| DatagramTransport::connect(&sandbox.endpoint(), &pool).expect("connect"))
            .collect();
        let slots: Vec<_> = held
            .iter()
            .filter_map(|transport| transport.local_path().map(Utf8Path::to_owned))
            .collect();
        assert_eq!(slots, vec![pool.slot_path(0), pool.slot_path(1), pool.slot_path(2)]);

        let error = DatagramTransport::connect(&sandbox.endpoint(), &pool)
            .expect_err("fourth connect exceeds the pool");
        assert!(matches!(error, TransportError::PoolExhausted { capacity: 3, .. }));
        assert!(error.to_string().starts_with("reached max socket file limit"));
    }

    #[rstest]
    fn freed_slot_is_reused(sandbox: Sandbox) {
        let pool = sandbox.pool(3);
        let first = DatagramTransport::connect(&sandbox.endpoint(), &pool).expect("first");
        let second = DatagramTransport::connect(&sandbox.endpoint(), &pool).expect("second");
        first.close().expect("close first");

        let third = DatagramTransport::connect(&sandbox.endpoint(), &pool).expect("third");
        assert_eq!(third.local_path(), Some(pool.slot_path(0).as_path()));
        drop(second);
    }

    #[rstest]
    fn missing_daemon_reports_searched_paths(sandbox: Sandbox) {
        let endpoint = CtrlEndpoint::unix(sandbox.root.join("absent"));
        let error = DatagramTransport::connect(&endpoint, &sandbox.pool(3))
            .expect_err("no daemon socket");
        let TransportError::NotFound { searched, .. } = error else {
            panic!("expected NotFound, got {error:?}");
        };
        assert!(searched.ends_with("absent"));
    }

    #[rstest]
    fn dial_failure_releases_allocated_slot(sandbox: Sandbox) {
        let stale = sandbox.root.join("stale");
        std::fs::write(stale.as_std_path(), b"").expect("plain file");
        let pool = sandbox.pool(3);

        let error = DatagramTransport::connect(&CtrlEndpoint::unix(stale), &pool)
            .expect_err("plain file is not a socket");
        assert!(matches!(error, TransportError::Connect { .. }));
        assert!(!pool.slot_path(0).as_std_path().exists());
    }
}
