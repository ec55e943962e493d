//! The control client: serialized command execution plus the shared event
//! subscription.
//!
//! A [`Client`] holds two transports. Commands go over the first, one at a
//! time, because the protocol pairs replies with requests purely by order.
//! The second transport is opened lazily by the first [`Client::notify`]
//! call and carries the event stream.

mod relay;
mod scan;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};
use wpa_ctrl_config::{Config, CtrlEndpoint, DEFAULT_SCAN_TIMEOUT_MS};

pub(crate) use relay::EVENTS_TARGET;
pub use relay::RAW_EVENT_CAPACITY;

use self::relay::EventChannel;
use crate::commands::{LIST_NETWORKS, PING};
use crate::error::CtrlError;
use crate::network::{Network, parse_networks};
use crate::registry::{EventStream, SubscriptionRegistry};
use crate::response::classify;
use crate::transport::{Connector, Dialer, EndpointPool, Transport, TransportError};

pub(crate) const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

/// Client for one supplicant control interface.
///
/// All methods take `&self`; share the client behind an [`Arc`] to issue
/// commands and manage subscriptions from several threads.
pub struct Client {
    connector: Arc<dyn Connector>,
    command: Arc<dyn Transport>,
    command_lock: Mutex<()>,
    events: Mutex<EventChannel>,
    registry: Arc<SubscriptionRegistry>,
    scan_timeout: Duration,
    closed: AtomicBool,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Client")
            .field("registry", &self.registry)
            .field("scan_timeout", &self.scan_timeout)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Connects to the control interface named by `config`.
    pub fn connect(config: &Config) -> Result<Self, CtrlError> {
        let endpoint = config.ctrl_endpoint()?;
        let client = Self::connect_endpoint(endpoint, EndpointPool::from_config(config))?;
        Ok(client.with_scan_timeout(config.scan_timeout()))
    }

    /// Connects to `endpoint`, drawing local endpoints from `pool`.
    pub fn connect_endpoint(endpoint: CtrlEndpoint, pool: EndpointPool) -> Result<Self, CtrlError> {
        Self::with_connector(Arc::new(Dialer::new(endpoint, pool)))
    }

    /// Builds a client over transports produced by `connector`. The command
    /// transport is opened immediately.
    pub fn with_connector(connector: Arc<dyn Connector>) -> Result<Self, CtrlError> {
        Self::with_registry(connector, Arc::new(SubscriptionRegistry::new()))
    }

    /// Like [`Client::with_connector`], fanning events out through
    /// `registry`.
    pub fn with_registry(
        connector: Arc<dyn Connector>,
        registry: Arc<SubscriptionRegistry>,
    ) -> Result<Self, CtrlError> {
        let command = connector.connect()?;
        debug!(target: CLIENT_TARGET, "control client connected");
        Ok(Self {
            connector,
            command,
            command_lock: Mutex::new(()),
            events: Mutex::new(EventChannel::default()),
            registry,
            scan_timeout: Duration::from_millis(DEFAULT_SCAN_TIMEOUT_MS),
            closed: AtomicBool::new(false),
        })
    }

    /// Overrides the wait used by [`Client::scan`].
    #[must_use]
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Wait used by [`Client::scan`].
    #[must_use]
    pub const fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    /// Registry the event channel dispatches into.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Sends `command` with `args` and returns the classified reply.
    ///
    /// Only one command is in flight per client; concurrent callers queue
    /// on an internal lock.
    ///
    /// # Errors
    ///
    /// Transport failures are returned unmodified. `UNKNOWN COMMAND`,
    /// `FAIL`, and argument rejections map onto the matching [`CtrlError`]
    /// variants.
    pub fn execute(&self, command: &str, args: &[&str]) -> Result<Vec<u8>, CtrlError> {
        if self.is_closed() {
            return Err(TransportError::Closed.into());
        }
        let line = wire_line(command, args);
        let reply = {
            let _guard = self
                .command_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.command.execute(line.as_bytes())?
        };
        classify(command, &reply).into_result()
    }

    /// Checks that the daemon answers `PING` with `PONG`.
    pub fn ping(&self) -> Result<(), CtrlError> {
        self.execute(PING, &[]).map(drop)
    }

    /// Lists the configured networks.
    pub fn list_networks(&self) -> Result<Vec<Network>, CtrlError> {
        let reply = self.execute(LIST_NETWORKS, &[])?;
        parse_networks(&reply).map_err(|source| CtrlError::Decode {
            command: LIST_NETWORKS,
            source,
        })
    }

    /// Subscribes to events named in `names`, or to every event when
    /// `names` is empty. Attaches the event channel on first use.
    ///
    /// # Errors
    ///
    /// Returns the attach failure unmodified; the subscription is then
    /// withdrawn.
    pub fn notify<I, S>(&self, names: I) -> Result<EventStream, CtrlError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut channel = self.lock_events();
        if self.is_closed() {
            return Err(TransportError::Closed.into());
        }
        // A relay that already ended would close the new subscriber.
        channel.settle();

        let stream = self.registry.subscribe(names);
        if let Err(error) = channel.attach(self.connector.as_ref(), &self.registry) {
            self.registry.unsubscribe(stream.id());
            return Err(error);
        }
        Ok(stream)
    }

    /// Ends one subscription and closes its stream. Returns `false` when it
    /// was already gone.
    pub fn stop(&self, stream: &EventStream) -> bool {
        self.registry.unsubscribe(stream.id())
    }

    /// Reports whether the event channel is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.lock_events().is_attached()
    }

    /// Attaches the event channel without registering a subscriber.
    /// Returns `false` when it was already attached.
    #[cfg(test)]
    pub(crate) fn attach(&self) -> Result<bool, CtrlError> {
        let mut channel = self.lock_events();
        if self.is_closed() {
            return Err(TransportError::Closed.into());
        }
        channel.attach(self.connector.as_ref(), &self.registry)
    }

    /// Detaches the event channel, ending every subscription. A detached
    /// channel is left untouched.
    pub fn detach(&self) -> Result<(), CtrlError> {
        self.lock_events().detach()
    }

    /// Closes both transports, detaching first. Every step is attempted;
    /// failures are reported together. Later calls do nothing.
    pub fn close(&self) -> Result<(), CtrlError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut failures = Vec::new();
        if let Err(error) = self.command.close() {
            failures.push(CtrlError::from(error));
        }
        {
            let mut channel = self.lock_events();
            if let Err(error) = channel.detach() {
                failures.push(error);
            }
            if let Err(error) = channel.close_transport() {
                failures.push(error);
            }
        }

        if failures.is_empty() {
            debug!(target: CLIENT_TARGET, "control client closed");
            Ok(())
        } else {
            Err(CtrlError::Teardown { failures })
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock_events(&self) -> MutexGuard<'_, EventChannel> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(target: CLIENT_TARGET, %error, "control client teardown failed");
        }
    }
}

fn wire_line(command: &str, args: &[&str]) -> String {
    if args.is_empty() {
        command.to_owned()
    } else {
        format!("{command} {}", args.join(" "))
    }
}
