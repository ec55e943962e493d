//! Rendering of operation results.
//!
//! Human output prints replies and events the way the supplicant spells
//! them and lays listings out as aligned tables. JSON output emits one
//! document per result, or one object per line for event streams.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;
use wpa_ctrl::{AccessPoint, AuthRequest, Event, Network};

use crate::AppError;

/// Output format selection for operation results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    #[default]
    Auto,
    /// Always render human-readable output.
    Human,
    /// Always emit JSON.
    Json,
}

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedOutputFormat {
    /// Plain text and aligned tables.
    Human,
    /// JSON documents.
    Json,
}

impl OutputFormat {
    /// Resolves the output format based on whether stdout is a terminal.
    #[must_use]
    pub const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto => {
                if stdout_is_terminal {
                    ResolvedOutputFormat::Human
                } else {
                    ResolvedOutputFormat::Json
                }
            }
            Self::Human => ResolvedOutputFormat::Human,
            Self::Json => ResolvedOutputFormat::Json,
        }
    }
}

#[derive(Serialize)]
struct ReplyView<'a> {
    command: &'a str,
    reply: &'a str,
}

#[derive(Serialize)]
struct EventView<'a> {
    severity: u8,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_request: Option<&'a AuthRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a Event> for EventView<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            severity: event.severity,
            message: &event.message,
            auth_request: event.auth_request.as_ref(),
            error: event.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Writes the reply to `command`.
pub(crate) fn write_reply<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    command: &str,
    reply: &[u8],
) -> Result<(), AppError> {
    let text = String::from_utf8_lossy(reply);
    match format {
        ResolvedOutputFormat::Human => {
            writeln!(out, "{}", text.trim_end_matches('\n')).map_err(AppError::WriteOutput)
        }
        ResolvedOutputFormat::Json => write_json(
            out,
            &ReplyView {
                command,
                reply: text.trim_end_matches('\n'),
            },
        ),
    }
}

/// Writes one event and flushes so streams appear as they arrive.
pub(crate) fn write_event<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    event: &Event,
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Human => {
            writeln!(out, "{}", render_event(event)).map_err(AppError::WriteOutput)?;
        }
        ResolvedOutputFormat::Json => {
            serde_json::to_writer(&mut *out, &EventView::from(event))
                .map_err(AppError::Serialise)?;
            out.write_all(b"\n").map_err(AppError::WriteOutput)?;
        }
    }
    out.flush().map_err(AppError::WriteOutput)
}

/// Writes a scan result listing.
pub(crate) fn write_access_points<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    access_points: &[AccessPoint],
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Json => write_json(out, &access_points),
        ResolvedOutputFormat::Human => {
            let rows = access_points
                .iter()
                .map(|ap| {
                    vec![
                        ap.bssid.to_string(),
                        ap.frequency.to_string(),
                        ap.signal_strength.to_string(),
                        render_flags(&ap.flags),
                        ap.ssid.clone(),
                    ]
                })
                .collect::<Vec<_>>();
            let table = render_table(&["BSSID", "FREQUENCY", "SIGNAL", "FLAGS", "SSID"], &rows);
            out.write_all(table.as_bytes())
                .map_err(AppError::WriteOutput)
        }
    }
}

/// Writes a configured network listing.
pub(crate) fn write_networks<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    networks: &[Network],
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Json => write_json(out, &networks),
        ResolvedOutputFormat::Human => {
            let rows = networks
                .iter()
                .map(|network| {
                    vec![
                        network.id.to_string(),
                        network.ssid.clone(),
                        network.bssid.clone(),
                        render_flags(&network.flags),
                    ]
                })
                .collect::<Vec<_>>();
            let table = render_table(&["ID", "SSID", "BSSID", "FLAGS"], &rows);
            out.write_all(table.as_bytes())
                .map_err(AppError::WriteOutput)
        }
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(AppError::Serialise)?;
    out.write_all(b"\n").map_err(AppError::WriteOutput)
}

fn render_event(event: &Event) -> String {
    if let Some(error) = &event.error {
        return format!("error: {error}");
    }
    match &event.auth_request {
        Some(request) => format!(
            "<{}>{}{}-{}:{}",
            event.severity, event.message, request.kind, request.network_id, request.text
        ),
        None => format!("<{}>{}", event.severity, event.message),
    }
}

fn render_flags(flags: &[String]) -> String {
    flags.iter().map(|flag| format!("[{flag}]")).collect()
}

/// Lays rows out in columns separated by two spaces. The last column is
/// not padded.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header_row: Vec<String> = headers.iter().map(|header| (*header).to_owned()).collect();
    let mut table = String::new();
    for row in std::iter::once(&header_row).chain(rows) {
        let last = row.len().saturating_sub(1);
        let line = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(index, (cell, width))| {
                if index == last {
                    cell.clone()
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        table.push_str(line.trim_end());
        table.push('\n');
    }
    table
}
