use std::borrow::Cow;

use opentelemetry::global;
use opentelemetry::trace::noop::{NoopSpan, NoopTracer};
use opentelemetry::trace::{SpanBuilder, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use opentelemetry_otlp::WithExportConfig;
use tracing::{debug, Subscriber};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;

use crate::telemetry::error::{Signal, TelemetryError};
use crate::telemetry::exporter::{ExporterConfig, ExporterKind};
use crate::telemetry::grpc::TraceContextInterceptor;
use crate::telemetry::middleware::HttpTracing;
use crate::telemetry::resource::{build_resource, ServiceInfo};

const NOOP_TRACER_NAME: &str = "test/tracer";

#[derive(Clone)]
enum Backend {
    Sdk {
        provider: SdkTracerProvider,
        tracer: SdkTracer,
    },
    Noop(NoopTracer),
}

/// Tracing handle of an [`Observer`](crate::telemetry::Observer).
///
/// Either backed by an SDK tracer provider or a no-op tracer for tests; both
/// hand out spans the same way so calling code does not care which it holds.
#[derive(Clone)]
pub struct Tracer {
    name: String,
    backend: Backend,
}

impl Tracer {
    /// Build the exporter, resource and tracer provider for `service`.
    ///
    /// Every span is sampled. Nothing is registered process-wide, see
    /// [`Tracer::install_global`].
    pub fn new(
        service: impl Into<ServiceInfo>,
        exporter: &ExporterConfig,
    ) -> Result<Self, TelemetryError> {
        let service = service.into();
        let span_exporter = build_span_exporter(exporter)?;
        let resource = build_resource(&service)?;

        let builder = SdkTracerProvider::builder()
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(resource);
        let provider = match span_exporter {
            SpanExporter::Console(exporter) => builder.with_batch_exporter(exporter),
            SpanExporter::Otlp(exporter) => builder.with_batch_exporter(exporter),
        }
        .build();

        debug!(target: "otel_lifecycle", service = %service.name, exporter = %exporter.kind, "tracer provider built");
        Ok(Self::from_provider(service.name, provider))
    }

    /// Wrap an already assembled provider
    pub fn from_provider(name: impl Into<String>, provider: SdkTracerProvider) -> Self {
        let name = name.into();
        let tracer = provider.tracer(name.clone());
        Self {
            name,
            backend: Backend::Sdk { provider, tracer },
        }
    }

    /// No-op tracer for tests: spans record nothing and never reach the
    /// network. Shutdown is not required.
    pub fn noop() -> Self {
        Self {
            name: NOOP_TRACER_NAME.to_string(),
            backend: Backend::Noop(NoopTracer::new()),
        }
    }

    /// Name of the tracer in use
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_noop(&self) -> bool {
        matches!(self.backend, Backend::Noop(_))
    }

    pub fn provider(&self) -> Option<&SdkTracerProvider> {
        match &self.backend {
            Backend::Sdk { provider, .. } => Some(provider),
            Backend::Noop(_) => None,
        }
    }

    /// Register the provider and the W3C trace-context propagator process-wide
    /// for libraries that only look up the global tracer.
    pub fn install_global(&self) {
        if let Backend::Sdk { provider, .. } = &self.backend {
            global::set_tracer_provider(provider.clone());
            global::set_text_map_propagator(TraceContextPropagator::new());
        }
    }

    /// Start a span as a child of the current context
    pub fn start(&self, span_name: impl Into<Cow<'static, str>>) -> Context {
        self.start_with_context(span_name, &Context::current())
    }

    /// Start a span as a child of `parent`; the returned context carries it
    pub fn start_with_context(
        &self,
        span_name: impl Into<Cow<'static, str>>,
        parent: &Context,
    ) -> Context {
        match &self.backend {
            Backend::Sdk { tracer, .. } => parent.with_span(tracer.start_with_context(span_name, parent)),
            Backend::Noop(tracer) => parent.with_span(tracer.start_with_context(span_name, parent)),
        }
    }

    /// Start a span described by `builder` (kind, attributes, ...)
    pub fn start_span(&self, builder: SpanBuilder, parent: &Context) -> Context {
        match &self.backend {
            Backend::Sdk { tracer, .. } => parent.with_span(builder.start_with_context(tracer, parent)),
            Backend::Noop(tracer) => parent.with_span(builder.start_with_context(tracer, parent)),
        }
    }

    /// Context carrying a non-recording span, the shape tracers produce.
    /// For tests.
    pub fn mock_context(&self, parent: &Context) -> Context {
        parent.with_span(NoopSpan::DEFAULT)
    }

    /// actix-web middleware opening one server span per request
    pub fn http_middleware(&self) -> HttpTracing {
        HttpTracing::new(self.clone())
    }

    /// tonic client interceptor propagating the current trace context
    pub fn grpc_interceptor(&self) -> TraceContextInterceptor {
        TraceContextInterceptor::new()
    }

    /// Layer exporting `tracing` spans through this tracer; `None` for the no-op tracer
    pub fn otel_layer<S>(&self) -> Option<OpenTelemetryLayer<S, SdkTracer>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        match &self.backend {
            Backend::Sdk { tracer, .. } => {
                Some(tracing_opentelemetry::layer().with_tracer(tracer.clone()))
            }
            Backend::Noop(_) => None,
        }
    }

    pub fn force_flush(&self) -> Result<(), TelemetryError> {
        match &self.backend {
            Backend::Sdk { provider, .. } => provider
                .force_flush()
                .map_err(TelemetryError::flush(Signal::Trace)),
            Backend::Noop(_) => Ok(()),
        }
    }

    /// Flush pending spans and stop the provider; no-op for the test tracer
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        match &self.backend {
            Backend::Sdk { provider, .. } => provider
                .shutdown()
                .map_err(TelemetryError::shutdown(Signal::Trace)),
            Backend::Noop(_) => Ok(()),
        }
    }
}

enum SpanExporter {
    Console(opentelemetry_stdout::SpanExporter),
    Otlp(opentelemetry_otlp::SpanExporter),
}

fn build_span_exporter(config: &ExporterConfig) -> Result<SpanExporter, TelemetryError> {
    let exporter = match config.kind {
        ExporterKind::Console => SpanExporter::Console(opentelemetry_stdout::SpanExporter::default()),
        ExporterKind::OtlpHttp => SpanExporter::Otlp(
            opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .with_endpoint(config.http_url("/v1/traces"))
                .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
                .build()
                .map_err(TelemetryError::exporter(Signal::Trace))?,
        ),
        ExporterKind::OtlpGrpc => SpanExporter::Otlp(
            opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(config.grpc_url())
                .build()
                .map_err(TelemetryError::exporter(Signal::Trace))?,
        ),
    };
    Ok(exporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanKind, TraceContextExt};
    use opentelemetry_sdk::trace::InMemorySpanExporter;

    fn in_memory_tracer() -> (Tracer, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (Tracer::from_provider("test-service", provider), exporter)
    }

    #[test]
    fn console_tracer_builds_offline() {
        let tracer = Tracer::new("checkout", &ExporterConfig::development()).unwrap();

        assert_eq!(tracer.name(), "checkout");
        assert!(!tracer.is_noop());
        assert!(tracer.provider().is_some());
        assert!(tracer.shutdown().is_ok());
    }

    #[test]
    fn console_tracer_samples_every_span() {
        let tracer = Tracer::new("checkout", &ExporterConfig::development()).unwrap();

        let cx = tracer.start("work");
        let span = cx.span();
        assert!(span.is_recording());
        assert!(span.span_context().is_valid());
        assert!(span.span_context().is_sampled());
        span.end();

        assert!(tracer.shutdown().is_ok());
    }

    #[test]
    fn http_tracer_builds_without_reachable_collector() {
        let exporter = ExporterConfig::production("collector.invalid").with_kind(ExporterKind::OtlpHttp);

        let tracer = Tracer::new("checkout", &exporter);

        assert!(tracer.is_ok());
    }

    #[tokio::test]
    async fn grpc_tracer_builds_without_reachable_collector() {
        // Connection is lazy: failures show up on the first export
        let exporter = ExporterConfig::production("collector.invalid");

        let tracer = Tracer::new("checkout", &exporter);

        assert!(tracer.is_ok());
    }

    #[tokio::test]
    async fn grpc_tracer_rejects_malformed_endpoint() {
        let exporter = ExporterConfig {
            kind: ExporterKind::OtlpGrpc,
            http_endpoint: "not a host:4318".to_string(),
            grpc_endpoint: "not a host:4317".to_string(),
        };

        let err = Tracer::new("checkout", &exporter).err().unwrap();

        assert_eq!(err.signal(), Some(Signal::Trace));
        assert!(matches!(err, TelemetryError::Exporter { .. }));
    }

    #[test]
    fn noop_tracer_records_nothing() {
        let tracer = Tracer::noop();

        let cx = tracer.start("work");

        assert!(tracer.is_noop());
        assert_eq!(tracer.name(), "test/tracer");
        assert!(tracer.provider().is_none());
        assert!(!cx.span().is_recording());
        assert!(!cx.span().span_context().is_valid());
    }

    #[test]
    fn noop_tracer_shutdown_is_a_no_op() {
        let tracer = Tracer::noop();

        assert!(tracer.shutdown().is_ok());
        assert!(tracer.shutdown().is_ok());
    }

    #[test]
    fn noop_tracer_has_no_otel_layer() {
        let layer = Tracer::noop().otel_layer::<tracing_subscriber::Registry>();

        assert!(layer.is_none());
    }

    #[test]
    fn mock_context_carries_non_recording_span() {
        let tracer = Tracer::noop();

        let cx = tracer.mock_context(&Context::new());

        assert!(cx.has_active_span());
        assert!(!cx.span().is_recording());
    }

    #[test]
    fn child_span_shares_parent_trace() {
        let (tracer, exporter) = in_memory_tracer();

        let parent = tracer.start("parent");
        let child = tracer.start_with_context("child", &parent);
        child.span().end();
        parent.span().end();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "child");
        assert_eq!(
            spans[0].span_context.trace_id(),
            spans[1].span_context.trace_id()
        );
        assert_eq!(spans[0].parent_span_id, spans[1].span_context.span_id());
    }

    #[test]
    fn start_span_applies_builder() {
        let (tracer, exporter) = in_memory_tracer();

        let cx = tracer.start_span(
            SpanBuilder::from_name("rpc").with_kind(SpanKind::Client),
            &Context::new(),
        );
        cx.span().end();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].span_kind, SpanKind::Client);
    }

    #[test]
    fn shutdown_twice_reports_already_shutdown() {
        let (tracer, _exporter) = in_memory_tracer();

        assert!(tracer.shutdown().is_ok());
        let err = tracer.shutdown().unwrap_err();

        assert!(matches!(
            err,
            TelemetryError::Shutdown {
                signal: Signal::Trace,
                ..
            }
        ));
    }
}
