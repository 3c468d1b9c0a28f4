// Error types for roadguard

use crate::telemetry::TelemetryOutput;
use snafu::Snafu;
use std::{io, sync::mpsc::SendError};

#[derive(Debug, Snafu)]
pub enum RoadGuardError {
    // Errors talking to the telemetry backend
    #[snafu(display("Invalid server URL: {url}"))]
    InvalidServerUrl { url: String },
    #[snafu(display("Could not build HTTP client"))]
    HttpClientError { source: reqwest::Error },
    #[snafu(display("Request to {endpoint} failed"))]
    HttpRequestError {
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("{endpoint} answered with status {status}"))]
    HttpStatusError { endpoint: String, status: u16 },
    #[snafu(display("Malformed payload from {endpoint}"))]
    MalformedPayload {
        endpoint: String,
        source: serde_json::Error,
    },

    // Errors while broadcasting telemetry
    #[snafu(display("Error broadcasting telemetry output"))]
    TelemetryBroadcastError {
        source: Box<SendError<TelemetryOutput>>,
    },
    #[snafu(display("Poll interval must be positive"))]
    InvalidPollInterval,
    #[snafu(display("Could not start the poller runtime"))]
    RuntimeError { source: io::Error },

    // Errors for the telemetry writer
    #[snafu(display("Error writing telemetry file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // UI errors
    #[snafu(display("Could not open the dashboard window: {description}"))]
    DashboardError { description: String },

    // Report errors
    #[snafu(display("Invalid telemetry file: {path}"))]
    InvalidTelemetryFile { path: String },
    #[snafu(display("Error loading telemetry file"))]
    TelemetryLoaderError { source: io::Error },
}

impl From<SendError<TelemetryOutput>> for RoadGuardError {
    fn from(value: SendError<TelemetryOutput>) -> Self {
        RoadGuardError::TelemetryBroadcastError {
            source: Box::new(value),
        }
    }
}
