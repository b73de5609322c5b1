//! OpenTelemetry traces, metrics and logs behind one handle.
//!
//! An [`Observer`] owns a [`Tracer`], a [`Meter`] and a [`Logger`] built
//! from the same [`ExporterConfig`] and shuts them down together.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! // Observer plus global tracing subscriber, configured from environment
//! let observer = telemetry::init()?;
//!
//! // ... run the service ...
//!
//! observer.shutdown()?;
//! ```
//!
//! # Configuration
//!
//! ## Using the Builder
//!
//! ```rust,ignore
//! use telemetry::{ObserverConfig, ShutdownPolicy};
//!
//! let config = ObserverConfig::builder()
//!     .service_name("checkout")
//!     .service_version("1.0.0")
//!     .production()
//!     .collector_host("otel-collector")
//!     .shutdown_policy(ShutdownPolicy::FailFast)
//!     .json()
//!     .build();
//!
//! let observer = telemetry::init_with_config(&config)?;
//! ```
//!
//! ## Without a subscriber
//!
//! ```rust,ignore
//! let observer = Observer::new("checkout", &ExporterConfig::development())?;
//! let cx = observer.tracer().start("reserve-stock");
//! ```
//!
//! ## Exporters
//!
//! - [`ExporterKind::Console`]: stdout, used by the development preset
//! - [`ExporterKind::OtlpHttp`]: OTLP/HTTP protobuf on port 4318
//! - [`ExporterKind::OtlpGrpc`]: OTLP/gRPC on port 4317, used by the production preset
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OTEL_SERVICE_NAME` | Service name | `CARGO_PKG_NAME` |
//! | `OTEL_SERVICE_VERSION` | Service version | `CARGO_PKG_VERSION` |
//! | `APP_ENV` | `production`/`prod` selects the OTLP/gRPC preset | `development` |
//! | `OTEL_COLLECTOR_HOST` | Collector host for the production preset | service name |
//! | `OTEL_EXPORTER` | `console`, `otlp-http` or `otlp-grpc` | preset |
//! | `RUST_LOG` | Log level filter | `info` |
//! | `LOG_FORMAT` | `pretty` or `json` | `pretty` |
//!
//! # Module Structure
//!
//! - [`api`]: Initialization functions
//! - [`config`]: Configuration types
//! - [`error`]: Error types
//! - [`exporter`]: Exporter presets
//! - [`observer`]: The combined handle
//! - [`trace`], [`metrics`], [`logs`]: Per-signal provider factories
//! - [`middleware`]: actix-web request tracing
//! - [`grpc`]: tonic context propagation
//! - [`subscriber`]: Global `tracing` subscriber

pub mod api;
pub mod config;
pub mod error;
pub mod exporter;
pub mod grpc;
pub mod logs;
pub mod metrics;
pub mod middleware;
pub mod observer;
pub mod resource;
pub mod subscriber;
pub mod trace;

// Re-exports
pub use api::{init, init_with_config};
pub use config::{Environment, LogFormat, ObserverConfig, ObserverConfigBuilder, ShutdownPolicy};
pub use error::{Signal, TelemetryError};
pub use exporter::{ExporterConfig, ExporterKind};
pub use grpc::TraceContextInterceptor;
pub use logs::Logger;
pub use metrics::Meter;
pub use middleware::HttpTracing;
pub use observer::Observer;
pub use resource::ServiceInfo;
pub use trace::Tracer;
