use std::fmt;

use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_sdk::error::OTelSdkError;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Telemetry signal a provider is responsible for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Trace,
    Metric,
    Log,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => f.write_str("trace"),
            Self::Metric => f.write_str("metric"),
            Self::Log => f.write_str("log"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{signal} exporter error: {source}")]
    Exporter {
        signal: Signal,
        #[source]
        source: ExporterBuildError,
    },

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("{signal} provider shutdown error: {source}")]
    Shutdown {
        signal: Signal,
        #[source]
        source: OTelSdkError,
    },

    #[error("{signal} provider flush error: {source}")]
    Flush {
        signal: Signal,
        #[source]
        source: OTelSdkError,
    },

    #[error("Shutdown failed: {}", join_errors(.0))]
    ShutdownFailed(Vec<TelemetryError>),

    #[error("Observer already shut down")]
    AlreadyShutdown,

    #[error("Subscriber error: {0}")]
    Subscriber(#[from] TryInitError),
}

impl TelemetryError {
    pub(crate) fn exporter(signal: Signal) -> impl FnOnce(ExporterBuildError) -> Self {
        move |source| Self::Exporter { signal, source }
    }

    pub(crate) fn shutdown(signal: Signal) -> impl FnOnce(OTelSdkError) -> Self {
        move |source| Self::Shutdown { signal, source }
    }

    pub(crate) fn flush(signal: Signal) -> impl FnOnce(OTelSdkError) -> Self {
        move |source| Self::Flush { signal, source }
    }

    /// Signal the error belongs to, if any
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Self::Exporter { signal, .. }
            | Self::Shutdown { signal, .. }
            | Self::Flush { signal, .. } => Some(*signal),
            _ => None,
        }
    }
}

fn join_errors(errors: &[TelemetryError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
