use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::{SdkLogger, SdkLoggerProvider};
use tracing::debug;

use crate::telemetry::error::{Signal, TelemetryError};
use crate::telemetry::exporter::{ExporterConfig, ExporterKind};
use crate::telemetry::resource::{build_resource, ServiceInfo};

/// Structured-log sink feeding `tracing` events into the logger provider
pub type LogBridge = OpenTelemetryTracingBridge<SdkLoggerProvider, SdkLogger>;

/// Logging handle of an [`Observer`](crate::telemetry::Observer)
#[derive(Clone)]
pub struct Logger {
    name: String,
    provider: SdkLoggerProvider,
}

impl Logger {
    /// Build the exporter, resource and batching logger provider for `service`
    pub fn new(
        service: impl Into<ServiceInfo>,
        exporter: &ExporterConfig,
    ) -> Result<Self, TelemetryError> {
        let service = service.into();
        let log_exporter = build_log_exporter(exporter)?;
        let resource = build_resource(&service)?;

        let builder = SdkLoggerProvider::builder().with_resource(resource);
        let provider = match log_exporter {
            LogExporter::Console(exporter) => builder.with_batch_exporter(exporter),
            LogExporter::Otlp(exporter) => builder.with_batch_exporter(exporter),
        }
        .build();

        debug!(target: "otel_lifecycle", service = %service.name, exporter = %exporter.kind, "logger provider built");
        Ok(Self::from_provider(service.name, provider))
    }

    /// Wrap an already assembled provider
    pub fn from_provider(name: impl Into<String>, provider: SdkLoggerProvider) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &SdkLoggerProvider {
        &self.provider
    }

    /// `tracing` layer forwarding events to this provider
    pub fn layer(&self) -> LogBridge {
        OpenTelemetryTracingBridge::new(&self.provider)
    }

    pub fn force_flush(&self) -> Result<(), TelemetryError> {
        self.provider
            .force_flush()
            .map_err(TelemetryError::flush(Signal::Log))
    }

    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        self.provider
            .shutdown()
            .map_err(TelemetryError::shutdown(Signal::Log))
    }
}

enum LogExporter {
    Console(opentelemetry_stdout::LogExporter),
    Otlp(opentelemetry_otlp::LogExporter),
}

fn build_log_exporter(config: &ExporterConfig) -> Result<LogExporter, TelemetryError> {
    let exporter = match config.kind {
        ExporterKind::Console => LogExporter::Console(opentelemetry_stdout::LogExporter::default()),
        ExporterKind::OtlpHttp => LogExporter::Otlp(
            opentelemetry_otlp::LogExporter::builder()
                .with_http()
                .with_endpoint(config.http_url("/v1/logs"))
                .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
                .build()
                .map_err(TelemetryError::exporter(Signal::Log))?,
        ),
        ExporterKind::OtlpGrpc => LogExporter::Otlp(
            opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(config.grpc_url())
                .build()
                .map_err(TelemetryError::exporter(Signal::Log))?,
        ),
    };
    Ok(exporter)
}
