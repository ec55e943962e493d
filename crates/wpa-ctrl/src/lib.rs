//! Client for the wpa_supplicant control interface.
//!
//! The daemon speaks a line oriented protocol over datagram sockets.
//! Commands are single lines such as `SCAN` or `SET_NETWORK 0 ssid "home"`
//! and each receives exactly one textual reply. After `ATTACH` the daemon
//! also pushes event frames like `<3>CTRL-EVENT-CONNECTED ...`.
//!
//! [`Client`] executes commands one at a time and classifies their replies,
//! and shares a single attached event socket between any number of
//! [`EventStream`] subscribers, each filtering on event names. Delivery is
//! best effort: a subscriber that falls behind loses events rather than
//! stalling the others.
//!
//! ```no_run
//! use wpa_ctrl::{Client, commands};
//! use wpa_ctrl_config::Config;
//!
//! # fn main() -> Result<(), wpa_ctrl::CtrlError> {
//! let client = Client::connect(&Config::default())?;
//! client.ping()?;
//! let stream = client.notify([commands::EVENT_CONNECTED])?;
//! if let Some(event) = stream.recv() {
//!     println!("{}", event.message);
//! }
//! client.close()
//! # }
//! ```

mod client;
pub mod commands;
mod error;
mod event;
mod network;
mod registry;
mod response;
mod transport;

#[cfg(all(unix, any(test, feature = "test-support")))]
pub mod test_support;

#[cfg(all(test, unix))]
mod tests;

pub use client::{Client, RAW_EVENT_CAPACITY};
pub use error::CtrlError;
pub use event::{AuthRequest, Event, EventError};
pub use network::{
    AccessPoint, DecodeError, MacAddress, Network, parse_access_points, parse_flags,
    parse_networks,
};
pub use registry::{EventStream, SUBSCRIBER_CAPACITY, SubscriptionId, SubscriptionRegistry};
pub use response::{Outcome, classify};
pub use transport::{
    Connector, DatagramTransport, Dialer, EndpointPool, ExchangeStage, MAX_FRAME_LEN, Transport,
    TransportError,
};
