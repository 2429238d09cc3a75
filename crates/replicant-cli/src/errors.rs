//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use replicant_client::{ConnectError, DisconnectError, DriverError, InvalidCall};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid call target: {0}")]
    InvalidTarget(#[from] InvalidCall),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Call(#[from] DriverError),
    #[error(transparent)]
    Disconnect(#[from] DisconnectError),
    #[error("failed to read input: {0}")]
    ReadInput(io::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
