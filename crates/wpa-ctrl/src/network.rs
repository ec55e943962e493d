//! Decoders for the tab separated listings returned by `LIST_NETWORKS` and
//! `SCAN_RESULTS`.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

const NETWORK_FIELDS: usize = 4;
const ACCESS_POINT_FIELDS: usize = 5;

/// Configured network, one row of `LIST_NETWORKS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    /// Network block id.
    pub id: u32,
    /// Network name.
    pub ssid: String,
    /// Pinned BSSID, or `any`.
    pub bssid: String,
    /// State flags such as `CURRENT` or `DISABLED`.
    pub flags: Vec<String>,
}

/// Access point seen by the last scan, one row of `SCAN_RESULTS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPoint {
    /// Hardware address of the access point.
    pub bssid: MacAddress,
    /// Network name.
    pub ssid: String,
    /// Channel frequency in MHz.
    pub frequency: u32,
    /// Signal level in dBm.
    pub signal_strength: i32,
    /// Capability flags such as `WPA2-PSK-CCMP` or `ESS`.
    pub flags: Vec<String>,
}

/// IEEE 802 hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Wraps six raw octets.
    #[must_use]
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = DecodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::MacAddress {
            value: value.to_owned(),
        };
        let mut octets = [0_u8; 6];
        let mut parts = value.split(':');
        for octet in &mut octets {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(formatter, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Failure to decode a tabular reply.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A row had the wrong number of columns.
    #[error("row {row}: expected {expected} fields, found {found}")]
    FieldCount {
        /// One-based row number, counting the header.
        row: usize,
        /// Column count of this listing.
        expected: usize,
        /// Columns present.
        found: usize,
    },
    /// A numeric column did not parse.
    #[error("invalid {field} '{value}': {source}")]
    Integer {
        /// Column name.
        field: &'static str,
        /// Offending text.
        value: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },
    /// A BSSID column was not a MAC address.
    #[error("invalid MAC address '{value}'")]
    MacAddress {
        /// Offending text.
        value: String,
    },
}

/// Splits a `[A][B]` flag column into `["A", "B"]`.
#[must_use]
pub fn parse_flags(column: &str) -> Vec<String> {
    let trimmed = column.trim();
    let opened = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = opened.strip_suffix(']').unwrap_or(opened);
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split("][").map(str::to_owned).collect()
}

/// Decodes a `LIST_NETWORKS` reply.
pub fn parse_networks(reply: &[u8]) -> Result<Vec<Network>, DecodeError> {
    let text = String::from_utf8_lossy(reply);
    rows::<NETWORK_FIELDS>(&text)
        .map(|row| {
            let [id, ssid, bssid, flags] = row?;
            Ok(Network {
                id: parse_integer("network id", id)?,
                ssid: ssid.to_owned(),
                bssid: bssid.to_owned(),
                flags: parse_flags(flags),
            })
        })
        .collect()
}

/// Decodes a `SCAN_RESULTS` reply.
pub fn parse_access_points(reply: &[u8]) -> Result<Vec<AccessPoint>, DecodeError> {
    let text = String::from_utf8_lossy(reply);
    rows::<ACCESS_POINT_FIELDS>(&text)
        .map(|row| {
            let [bssid, frequency, signal, flags, ssid] = row?;
            Ok(AccessPoint {
                bssid: bssid.parse()?,
                ssid: ssid.to_owned(),
                frequency: parse_integer("frequency", frequency)?,
                signal_strength: parse_integer("signal level", signal)?,
                flags: parse_flags(flags),
            })
        })
        .collect()
}

/// Data rows of a listing: the header line and blank lines are skipped.
fn rows<const N: usize>(text: &str) -> impl Iterator<Item = Result<[&str; N], DecodeError>> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let fields: Vec<&str> = line.split('\t').collect();
            let found = fields.len();
            <[&str; N]>::try_from(fields).map_err(|_| DecodeError::FieldCount {
                row: index + 1,
                expected: N,
                found,
            })
        })
}

fn parse_integer<T>(field: &'static str, value: &str) -> Result<T, DecodeError>
where
    T: FromStr<Err = ParseIntError>,
{
    value.trim().parse().map_err(|source| DecodeError::Integer {
        field,
        value: value.to_owned(),
        source,
    })
}
