//! Bounded pool of local datagram endpoints.
//!
//! A connectionless Unix socket needs its own bound path so the daemon can
//! address replies. Each process owns `capacity` slots named
//! `wpa_ctrl_<pid>-<index>` inside the pool directory; a slot is free when
//! no file exists at its path.

use std::fs;
use std::io;
use std::process;

use camino::{Utf8Path, Utf8PathBuf};
use wpa_ctrl_config::{Config, DEFAULT_ENDPOINT_POOL_SIZE, default_local_socket_dir};

#[cfg(unix)]
use socket2::{SockAddr, Socket};
#[cfg(unix)]
use tracing::debug;

use super::TransportError;
#[cfg(unix)]
use super::TRANSPORT_TARGET;

/// Allocator for the local endpoints of Unix datagram transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPool {
    directory: Utf8PathBuf,
    capacity: usize,
}

impl Default for EndpointPool {
    fn default() -> Self {
        Self::new(default_local_socket_dir(), DEFAULT_ENDPOINT_POOL_SIZE)
    }
}

impl EndpointPool {
    /// Creates a pool of `capacity` slots inside `directory`.
    #[must_use]
    pub fn new(directory: impl Into<Utf8PathBuf>, capacity: usize) -> Self {
        Self {
            directory: directory.into(),
            capacity,
        }
    }

    /// Builds the pool described by the shared configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.local_socket_dir(), config.endpoint_pool_size)
    }

    /// Directory holding the slots.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        self.directory.as_path()
    }

    /// Number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Path of the slot at `index` for the current process.
    #[must_use]
    pub fn slot_path(&self, index: usize) -> Utf8PathBuf {
        self.directory
            .join(format!("wpa_ctrl_{}-{index}", process::id()))
    }

    /// Binds `socket` to the lowest free slot and returns its path.
    ///
    /// A slot whose file exists, or whose bind reports the address in use,
    /// counts as occupied.
    #[cfg(unix)]
    pub(crate) fn bind_free_slot(&self, socket: &Socket) -> Result<Utf8PathBuf, TransportError> {
        for index in 0..self.capacity {
            let path = self.slot_path(index);
            if slot_occupied(&path) {
                continue;
            }
            let address = SockAddr::unix(path.as_std_path()).map_err(|source| {
                TransportError::Bind {
                    address: path.to_string(),
                    source,
                }
            })?;
            match socket.bind(&address) {
                Ok(()) => {
                    debug!(
                        target: TRANSPORT_TARGET,
                        slot = index,
                        path = %path,
                        "allocated local endpoint"
                    );
                    return Ok(path);
                }
                Err(error) if error.kind() == io::ErrorKind::AddrInUse => {}
                Err(source) => {
                    return Err(TransportError::Bind {
                        address: path.to_string(),
                        source,
                    });
                }
            }
        }

        Err(TransportError::PoolExhausted {
            directory: self.directory.clone(),
            capacity: self.capacity,
        })
    }
}

fn slot_occupied(path: &Utf8Path) -> bool {
    match fs::symlink_metadata(path.as_std_path()) {
        Ok(_) => true,
        Err(error) => error.kind() != io::ErrorKind::NotFound,
    }
}

/// Removes a slot file, treating an already missing file as success.
pub(crate) fn release_slot(path: &Utf8Path) -> io::Result<()> {
    match fs::remove_file(path.as_std_path()) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}
