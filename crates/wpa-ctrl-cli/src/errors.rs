//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use wpa_ctrl::CtrlError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: CtrlError,
    },
    #[error("{operation} failed: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: CtrlError,
    },
    #[error("failed to close the control connection: {0}")]
    Close(#[source] CtrlError),
    #[error("failed to serialise output: {0}")]
    Serialise(#[source] serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] io::Error),
}

impl AppError {
    pub(crate) fn operation(operation: &'static str) -> impl FnOnce(CtrlError) -> Self {
        move |source| Self::Operation { operation, source }
    }
}
