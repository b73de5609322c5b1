use opentelemetry::trace::TraceContextExt;
use opentelemetry::KeyValue;
use otel_observer::telemetry::{
    init_with_config, ExporterConfig, Logger, Meter, Observer, ObserverConfig, ShutdownPolicy,
    TelemetryError, Tracer,
};
use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};

#[test]
fn console_observer_records_and_shuts_down_once() {
    let config = ObserverConfig::new("checkout", "1.0.0").with_register_global(false);
    let observer = Observer::from_config(&config).unwrap();

    let cx = observer.tracer().start("reserve-stock");
    assert!(cx.span().span_context().is_valid());
    cx.span().end();

    let counter = observer.meter().meter().u64_counter("orders").build();
    counter.add(1, &[KeyValue::new("region", "eu")]);

    assert!(observer.shutdown().is_ok());
    assert!(matches!(
        observer.shutdown(),
        Err(TelemetryError::AlreadyShutdown)
    ));
}

#[test]
fn flushed_signals_reach_their_exporters() {
    let spans = InMemorySpanExporter::default();
    let metrics = InMemoryMetricExporter::default();
    let logs = InMemoryLogExporter::default();

    let tracer = Tracer::from_provider(
        "checkout",
        SdkTracerProvider::builder()
            .with_batch_exporter(spans.clone())
            .build(),
    );
    let meter = Meter::from_provider(
        "checkout",
        SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(metrics.clone()).build())
            .build(),
    );
    let logger = Logger::from_provider(
        "checkout",
        SdkLoggerProvider::builder()
            .with_batch_exporter(logs.clone())
            .build(),
    );
    let observer = Observer::from_parts(
        "checkout",
        ExporterConfig::development(),
        tracer,
        meter,
        logger,
        ShutdownPolicy::BestEffort,
    );

    let cx = observer.tracer().start("charge-card");
    cx.span().end();
    observer
        .meter()
        .meter()
        .u64_counter("payments")
        .build()
        .add(3, &[]);

    observer.tracer().force_flush().unwrap();
    observer.meter().force_flush().unwrap();
    observer.logger().force_flush().unwrap();

    assert_eq!(spans.get_finished_spans().unwrap().len(), 1);
    assert!(!metrics.get_finished_metrics().unwrap().is_empty());
    assert!(observer.shutdown().is_ok());
}

#[test]
fn noop_tracer_hands_out_non_recording_spans() {
    let tracer = Tracer::noop();

    let cx = tracer.start("anything");

    assert!(tracer.is_noop());
    assert!(!cx.span().is_recording());
    assert!(tracer.shutdown().is_ok());
}

#[test]
fn init_installs_the_subscriber_only_once() {
    let config = ObserverConfig::new("checkout", "1.0.0").with_register_global(false);

    let observer = init_with_config(&config).unwrap();
    tracing::info!(order_id = 7, "order placed");
    let second = init_with_config(&config);

    assert!(matches!(second, Err(TelemetryError::Subscriber(_))));
    assert!(observer.shutdown().is_ok());
}
