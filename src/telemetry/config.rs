use std::env;

use crate::telemetry::exporter::{ExporterConfig, ExporterKind};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty human-readable format with colors (for local dev)
    #[default]
    Pretty,
    /// JSON structured format (for cloud environments)
    Json,
}

/// Deployment environment, selects the exporter preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// `production` / `prod` (any case) select production, anything else development
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// What [`Observer::shutdown`](crate::telemetry::Observer::shutdown) does when a provider fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Shut every provider down and report all failures together
    #[default]
    BestEffort,
    /// Stop at the first failure, leaving later providers running
    FailFast,
}

/// Main observer configuration
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: Environment,
    /// Collector host for the production preset; the service name when unset
    pub collector_host: Option<String>,
    /// Overrides the preset's exporter kind
    pub exporter_kind: Option<ExporterKind>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub shutdown_policy: ShutdownPolicy,
    /// Also install the tracer and meter providers process-wide
    pub register_global: bool,
}

impl ObserverConfig {
    /// Create config from environment variables
    /// - APP_ENV=production|prod selects the OTLP/gRPC preset
    /// - OTEL_COLLECTOR_HOST and OTEL_EXPORTER refine it
    pub fn from_env() -> Self {
        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Pretty,
        };

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string()),
            service_version: env::var("OTEL_SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            environment: env::var("APP_ENV")
                .map(|value| Environment::parse(&value))
                .unwrap_or_default(),
            collector_host: env::var("OTEL_COLLECTOR_HOST").ok(),
            exporter_kind: env::var("OTEL_EXPORTER")
                .ok()
                .and_then(|value| value.parse().ok()),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format,
            shutdown_policy: ShutdownPolicy::default(),
            register_global: true,
        }
    }

    /// Create a new config with explicit values
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            environment: Environment::Development,
            collector_host: None,
            exporter_kind: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            shutdown_policy: ShutdownPolicy::BestEffort,
            register_global: true,
        }
    }

    pub fn builder() -> ObserverConfigBuilder {
        ObserverConfigBuilder::default()
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_collector_host(mut self, host: impl Into<String>) -> Self {
        self.collector_host = Some(host.into());
        self
    }

    pub fn with_exporter_kind(mut self, kind: ExporterKind) -> Self {
        self.exporter_kind = Some(kind);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    pub fn with_register_global(mut self, register: bool) -> Self {
        self.register_global = register;
        self
    }

    /// Resolve the exporter preset for this config
    pub fn exporter(&self) -> ExporterConfig {
        let collector = self
            .collector_host
            .as_deref()
            .unwrap_or(&self.service_name);
        let exporter = ExporterConfig::new(collector, self.environment.is_prod());

        match self.exporter_kind {
            Some(kind) => exporter.with_kind(kind),
            None => exporter,
        }
    }
}

#[derive(Default)]
pub struct ObserverConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    environment: Option<Environment>,
    collector_host: Option<String>,
    exporter_kind: Option<ExporterKind>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
    shutdown_policy: Option<ShutdownPolicy>,
    register_global: Option<bool>,
}

impl ObserverConfigBuilder {
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn production(self) -> Self {
        self.environment(Environment::Production)
    }

    pub fn collector_host(mut self, host: impl Into<String>) -> Self {
        self.collector_host = Some(host.into());
        self
    }

    pub fn exporter_kind(mut self, kind: ExporterKind) -> Self {
        self.exporter_kind = Some(kind);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    pub fn json(self) -> Self {
        self.log_format(LogFormat::Json)
    }

    pub fn pretty(self) -> Self {
        self.log_format(LogFormat::Pretty)
    }

    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = Some(policy);
        self
    }

    pub fn register_global(mut self, register: bool) -> Self {
        self.register_global = Some(register);
        self
    }

    pub fn build(self) -> ObserverConfig {
        ObserverConfig {
            service_name: self
                .service_name
                .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
            service_version: self
                .service_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            environment: self.environment.unwrap_or_default(),
            collector_host: self.collector_host,
            exporter_kind: self.exporter_kind,
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            log_format: self.log_format.unwrap_or_default(),
            shutdown_policy: self.shutdown_policy.unwrap_or_default(),
            register_global: self.register_global.unwrap_or(true),
        }
    }
}
