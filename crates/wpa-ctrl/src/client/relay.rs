//! Event channel state machine: ATTACH, the background receive loop, the
//! dispatcher thread and DETACH.
//!
//! Frames travel through two bounded hops. The receive loop parses each
//! frame and offers it to a raw queue of [`RAW_EVENT_CAPACITY`] events; the
//! dispatcher drains that queue into the subscriber queues. Both offers drop
//! on a full queue, so neither the socket reader nor the dispatcher ever
//! waits on a slow consumer.

use std::io;
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::commands::{ATTACH, DETACH};
use crate::error::CtrlError;
use crate::event::{Event, EventError};
use crate::registry::SubscriptionRegistry;
use crate::response::classify;
use crate::transport::{Connector, Transport, TransportError};

pub(crate) const EVENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// Raw events buffered between the receive loop and the dispatcher.
pub const RAW_EVENT_CAPACITY: usize = 10;

const DETACH_ACK: &[u8] = b"OK\n";
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const DETACH_GRACE: Duration = Duration::from_secs(1);
const ACK_POLL: Duration = Duration::from_millis(5);
const RECEIVER_THREAD: &str = "wpa-ctrl-events";
const DISPATCHER_THREAD: &str = "wpa-ctrl-dispatch";

/// Producer side of the raw event queue. Closing it ends the dispatcher.
struct RawEventSink {
    sender: Mutex<Option<SyncSender<Event>>>,
}

impl RawEventSink {
    const fn new(sender: SyncSender<Event>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    fn offer(&self, event: Event) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| sender.try_send(event).is_ok())
    }

    fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// State of the event channel. Guarded by its own lock inside the client.
#[derive(Default)]
pub(crate) struct EventChannel {
    transport: Option<Arc<dyn Transport>>,
    attached: bool,
    sink: Option<Arc<RawEventSink>>,
    receiver: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl EventChannel {
    /// Attached, with a receive loop still running.
    pub(crate) fn is_attached(&self) -> bool {
        self.attached
            && self
                .receiver
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Drops the relay left behind by a receive loop that ended on its own,
    /// for example because the daemon went away.
    pub(crate) fn settle(&mut self) {
        if !self.receiver.as_ref().is_some_and(JoinHandle::is_finished) {
            return;
        }
        if self.attached {
            debug!(target: EVENTS_TARGET, "event receive loop ended; channel detached");
            self.attached = false;
        }
        self.stop_relay();
    }

    /// Sends ATTACH and starts the relay. Returns `Ok(false)` when already
    /// attached.
    pub(crate) fn attach(
        &mut self,
        connector: &dyn Connector,
        registry: &Arc<SubscriptionRegistry>,
    ) -> Result<bool, CtrlError> {
        self.settle();
        if self.attached {
            return Ok(false);
        }

        // A loop still waiting for a previous DETACH acknowledgement would
        // compete for frames on the same socket.
        if self.receiver.is_some() {
            if let Err(error) = self.close_transport() {
                warn!(target: EVENTS_TARGET, %error, "failed to retire previous event socket");
            }
        }
        self.stop_relay();

        let transport = self.transport(connector)?;
        let reply = match transport.execute(ATTACH.as_bytes()) {
            Ok(reply) => reply,
            Err(error) => {
                if error.is_disconnect() {
                    self.transport = None;
                }
                return Err(error.into());
            }
        };
        classify(ATTACH, &reply).into_result()?;

        let (sender, source) = mpsc::sync_channel(RAW_EVENT_CAPACITY);
        let sink = Arc::new(RawEventSink::new(sender));

        let fan_out = Arc::clone(registry);
        let dispatcher = spawn_named(DISPATCHER_THREAD, move || {
            fan_out.dispatch_until_closed(&source);
        })?;

        let loop_sink = Arc::clone(&sink);
        let loop_transport = Arc::clone(&transport);
        let receiver = match spawn_named(RECEIVER_THREAD, move || {
            receive_loop(loop_transport.as_ref(), &loop_sink);
        }) {
            Ok(handle) => handle,
            Err(error) => {
                sink.close();
                join_named(DISPATCHER_THREAD, dispatcher);
                return Err(error);
            }
        };

        self.sink = Some(sink);
        self.dispatcher = Some(dispatcher);
        self.receiver = Some(receiver);
        self.attached = true;
        debug!(target: EVENTS_TARGET, "attached to event stream");
        Ok(true)
    }

    /// Flips to detached, ends the dispatcher (closing every subscriber)
    /// and sends DETACH. The receive loop exits when the acknowledgement
    /// arrives, which detach awaits for up to `DETACH_GRACE`.
    pub(crate) fn detach(&mut self) -> Result<(), CtrlError> {
        self.settle();
        if !self.attached {
            return Ok(());
        }
        self.attached = false;
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        if let Some(handle) = self.dispatcher.take() {
            join_named(DISPATCHER_THREAD, handle);
        }

        let transport = self.transport.as_ref().ok_or(TransportError::Closed)?;
        transport.send(DETACH.as_bytes())?;
        self.await_receiver(DETACH_GRACE);
        debug!(target: EVENTS_TARGET, "detached from event stream");
        Ok(())
    }

    fn await_receiver(&mut self, grace: Duration) {
        let deadline = Instant::now() + grace;
        while self
            .receiver
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            if Instant::now() >= deadline {
                debug!(target: EVENTS_TARGET, "detach acknowledgement still pending");
                return;
            }
            thread::sleep(ACK_POLL);
        }
        if let Some(handle) = self.receiver.take() {
            join_named(RECEIVER_THREAD, handle);
        }
    }

    /// Closes the event socket and waits for the receive loop.
    pub(crate) fn close_transport(&mut self) -> Result<(), CtrlError> {
        let Some(transport) = self.transport.take() else {
            return Ok(());
        };
        let closed = transport.close();
        if let Some(handle) = self.receiver.take() {
            join_named(RECEIVER_THREAD, handle);
        }
        closed.map_err(CtrlError::from)
    }

    fn transport(&mut self, connector: &dyn Connector) -> Result<Arc<dyn Transport>, CtrlError> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }
        let transport = connector.connect()?;
        self.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    fn stop_relay(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        if let Some(handle) = self.dispatcher.take() {
            join_named(DISPATCHER_THREAD, handle);
        }
        if let Some(handle) = self.receiver.take() {
            join_named(RECEIVER_THREAD, handle);
        }
    }
}

fn receive_loop(transport: &dyn Transport, sink: &RawEventSink) {
    loop {
        match transport.receive() {
            Ok(frame) if frame == DETACH_ACK => {
                debug!(target: EVENTS_TARGET, "detach acknowledged");
                break;
            }
            Ok(frame) => {
                let event = Event::parse(&frame);
                let message = event.message.clone();
                if !sink.offer(event) {
                    debug!(target: EVENTS_TARGET, %message, "raw event queue full; frame dropped");
                }
            }
            Err(error) if error.is_disconnect() => {
                debug!(target: EVENTS_TARGET, %error, "event socket closed");
                break;
            }
            Err(error) => {
                warn!(target: EVENTS_TARGET, %error, "event receive failed");
                sink.offer(Event::failed(EventError::Receive {
                    message: error.to_string(),
                }));
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    sink.close();
}

fn spawn_named<F>(name: &'static str, body: F) -> Result<JoinHandle<()>, CtrlError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(body)
        .map_err(|source: io::Error| CtrlError::Spawn { name, source })
}

fn join_named(name: &'static str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        warn!(target: EVENTS_TARGET, thread = name, "background thread panicked");
    }
}
