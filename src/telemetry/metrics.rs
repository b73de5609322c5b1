use opentelemetry::global;
use opentelemetry::metrics::{Meter as OtelMeter, MeterProvider as _};
use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;
use tracing::debug;

use crate::telemetry::error::{Signal, TelemetryError};
use crate::telemetry::exporter::{ExporterConfig, ExporterKind};
use crate::telemetry::resource::{build_resource, ServiceInfo};

/// Metrics handle of an [`Observer`](crate::telemetry::Observer)
#[derive(Clone)]
pub struct Meter {
    name: String,
    meter: OtelMeter,
    provider: SdkMeterProvider,
}

impl Meter {
    /// Build the exporter, resource and meter provider for `service`.
    /// Metrics are collected by a periodic reader at the SDK default interval.
    pub fn new(
        service: impl Into<ServiceInfo>,
        exporter: &ExporterConfig,
    ) -> Result<Self, TelemetryError> {
        let service = service.into();
        let metric_exporter = build_metric_exporter(exporter)?;
        let resource = build_resource(&service)?;

        let provider = match metric_exporter {
            MetricExporter::Console(exporter) => periodic_provider(exporter, resource),
            MetricExporter::Otlp(exporter) => periodic_provider(exporter, resource),
        };

        debug!(target: "otel_lifecycle", service = %service.name, exporter = %exporter.kind, "meter provider built");
        Ok(Self::from_provider(service.name, provider))
    }

    /// Wrap an already assembled provider
    pub fn from_provider(name: impl Into<String>, provider: SdkMeterProvider) -> Self {
        let name = name.into();
        let scope = InstrumentationScope::builder(name.clone()).build();
        let meter = provider.meter_with_scope(scope);
        Self {
            name,
            meter,
            provider,
        }
    }

    /// Name of the meter in use
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instrument factory scoped to this service
    pub fn meter(&self) -> &OtelMeter {
        &self.meter
    }

    pub fn provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    /// Register the provider process-wide for libraries that only look up
    /// the global meter provider.
    pub fn install_global(&self) {
        global::set_meter_provider(self.provider.clone());
    }

    /// Collect and export now instead of waiting for the next interval
    pub fn force_flush(&self) -> Result<(), TelemetryError> {
        self.provider
            .force_flush()
            .map_err(TelemetryError::flush(Signal::Metric))
    }

    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        self.provider
            .shutdown()
            .map_err(TelemetryError::shutdown(Signal::Metric))
    }
}

enum MetricExporter {
    Console(opentelemetry_stdout::MetricExporter),
    Otlp(opentelemetry_otlp::MetricExporter),
}

fn periodic_provider<E>(exporter: E, resource: Resource) -> SdkMeterProvider
where
    E: PushMetricExporter,
{
    SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(PeriodicReader::builder(exporter).build())
        .build()
}

fn build_metric_exporter(config: &ExporterConfig) -> Result<MetricExporter, TelemetryError> {
    let exporter = match config.kind {
        ExporterKind::Console => {
            MetricExporter::Console(opentelemetry_stdout::MetricExporter::default())
        }
        ExporterKind::OtlpHttp => MetricExporter::Otlp(
            opentelemetry_otlp::MetricExporter::builder()
                .with_http()
                .with_endpoint(config.http_url("/v1/metrics"))
                .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
                .build()
                .map_err(TelemetryError::exporter(Signal::Metric))?,
        ),
        ExporterKind::OtlpGrpc => MetricExporter::Otlp(
            opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(config.grpc_url())
                .build()
                .map_err(TelemetryError::exporter(Signal::Metric))?,
        ),
    };
    Ok(exporter)
}
