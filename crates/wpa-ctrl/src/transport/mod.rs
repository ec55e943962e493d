//! Datagram transports to the supplicant control interface.
//!
//! A [`Transport`] carries one frame per call in each direction. The client
//! keeps two of them: one for commands and one for the event stream.

mod datagram;
mod errors;
mod pool;

use std::sync::Arc;

pub use datagram::{DatagramTransport, Dialer};
pub use errors::{ExchangeStage, TransportError};
pub use pool::EndpointPool;

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Largest frame read from the daemon in one call.
pub const MAX_FRAME_LEN: usize = 4096;

/// Bidirectional frame channel to the daemon.
///
/// Implementations are shared between the caller and the event receive
/// thread, so every method takes `&self`.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Writes one frame. Fails with [`TransportError::ShortWrite`] when the
    /// socket accepts fewer bytes than supplied.
    fn send(&self, payload: &[u8]) -> Result<(), TransportError>;

    /// Blocks until exactly one frame arrives.
    fn receive(&self) -> Result<Vec<u8>, TransportError>;

    /// Releases the connection and any local endpoint. Safe to call twice.
    fn close(&self) -> Result<(), TransportError>;

    /// Sends `payload` and waits for the single reply frame.
    fn execute(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.send(payload)
            .map_err(|error| TransportError::exchange(ExchangeStage::Send, error))?;
        self.receive()
            .map_err(|error| TransportError::exchange(ExchangeStage::Receive, error))
    }
}

/// Opens transports to one daemon endpoint.
pub trait Connector: Send + Sync {
    /// Establishes a fresh transport.
    fn connect(&self) -> Result<Arc<dyn Transport>, TransportError>;
}
