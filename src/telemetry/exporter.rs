use std::fmt;
use std::str::FromStr;

/// Default OTLP/gRPC port
pub const GRPC_PORT: u16 = 4317;

/// Default OTLP/HTTP port
pub const HTTP_PORT: u16 = 4318;

const LOCALHOST: &str = "localhost";

/// Export backend for every signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExporterKind {
    /// Human-readable output on stdout, no network
    #[default]
    Console,
    /// OTLP over HTTP (protobuf)
    OtlpHttp,
    /// OTLP over gRPC
    OtlpGrpc,
}

impl ExporterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::OtlpHttp => "otlp-http",
            Self::OtlpGrpc => "otlp-grpc",
        }
    }
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExporterKind {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to [`ExporterKind::Console`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "otlp-http" | "http" => Self::OtlpHttp,
            "otlp-grpc" | "grpc" | "otlp" => Self::OtlpGrpc,
            _ => Self::Console,
        };
        Ok(kind)
    }
}

/// Which backend to export to, plus the collector endpoints for the OTLP kinds.
///
/// Endpoints are `host:port` without a scheme. Reachability is not checked
/// here; a bad endpoint surfaces when the exporter client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub kind: ExporterKind,
    pub http_endpoint: String,
    pub grpc_endpoint: String,
}

impl ExporterConfig {
    /// Pick the production preset when `is_prod`, the development one otherwise
    pub fn new(service_name: &str, is_prod: bool) -> Self {
        if is_prod {
            Self::production(service_name)
        } else {
            Self::development()
        }
    }

    /// Console export, OTLP endpoints pointing at a local collector
    pub fn development() -> Self {
        Self {
            kind: ExporterKind::Console,
            http_endpoint: format!("{LOCALHOST}:{HTTP_PORT}"),
            grpc_endpoint: format!("{LOCALHOST}:{GRPC_PORT}"),
        }
    }

    /// OTLP/gRPC export to the collector reachable as `collector`
    pub fn production(collector: &str) -> Self {
        Self {
            kind: ExporterKind::OtlpGrpc,
            http_endpoint: format!("{collector}:{HTTP_PORT}"),
            grpc_endpoint: format!("{collector}:{GRPC_PORT}"),
        }
    }

    pub fn with_kind(mut self, kind: ExporterKind) -> Self {
        self.kind = kind;
        self
    }

    /// Full OTLP/HTTP URL for one signal path, e.g. `/v1/traces`
    pub fn http_url(&self, signal_path: &str) -> String {
        format!("{}{}", with_scheme(&self.http_endpoint), signal_path)
    }

    /// OTLP/gRPC URL (plaintext)
    pub fn grpc_url(&self) -> String {
        with_scheme(&self.grpc_endpoint)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self::development()
    }
}

// Insecure transport only: bare endpoints get plain http.
fn with_scheme(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_preset_for_checkout() {
        let config = ExporterConfig::new("checkout", false);

        assert_eq!(
            config,
            ExporterConfig {
                kind: ExporterKind::Console,
                http_endpoint: "localhost:4318".to_string(),
                grpc_endpoint: "localhost:4317".to_string(),
            }
        );
    }

    #[test]
    fn production_preset_for_checkout() {
        let config = ExporterConfig::new("checkout", true);

        assert_eq!(
            config,
            ExporterConfig {
                kind: ExporterKind::OtlpGrpc,
                http_endpoint: "checkout:4318".to_string(),
                grpc_endpoint: "checkout:4317".to_string(),
            }
        );
    }

    #[test]
    fn presets_are_deterministic() {
        for is_prod in [false, true] {
            let first = ExporterConfig::new("orders", is_prod);
            let second = ExporterConfig::new("orders", is_prod);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn development_ignores_service_name() {
        assert_eq!(
            ExporterConfig::new("a", false),
            ExporterConfig::new("b", false)
        );
    }

    #[test]
    fn with_kind_keeps_endpoints() {
        let config = ExporterConfig::production("collector").with_kind(ExporterKind::OtlpHttp);

        assert_eq!(config.kind, ExporterKind::OtlpHttp);
        assert_eq!(config.http_endpoint, "collector:4318");
        assert_eq!(config.grpc_endpoint, "collector:4317");
    }

    #[test]
    fn urls_get_plain_http_scheme() {
        let config = ExporterConfig::development();

        assert_eq!(config.grpc_url(), "http://localhost:4317");
        assert_eq!(
            config.http_url("/v1/traces"),
            "http://localhost:4318/v1/traces"
        );
    }

    #[test]
    fn urls_keep_explicit_scheme() {
        let config = ExporterConfig {
            kind: ExporterKind::OtlpHttp,
            http_endpoint: "https://collector.example.com/".to_string(),
            grpc_endpoint: "https://collector.example.com:4317".to_string(),
        };

        assert_eq!(
            config.http_url("/v1/logs"),
            "https://collector.example.com/v1/logs"
        );
        assert_eq!(config.grpc_url(), "https://collector.example.com:4317");
    }

    #[test]
    fn kind_parsing_falls_back_to_console() {
        assert_eq!("otlp-grpc".parse::<ExporterKind>(), Ok(ExporterKind::OtlpGrpc));
        assert_eq!("HTTP".parse::<ExporterKind>(), Ok(ExporterKind::OtlpHttp));
        assert_eq!("console".parse::<ExporterKind>(), Ok(ExporterKind::Console));
        assert_eq!("zipkin".parse::<ExporterKind>(), Ok(ExporterKind::Console));
    }

    #[test]
    fn kind_display_round_trips_through_parse() {
        for kind in [ExporterKind::Console, ExporterKind::OtlpHttp, ExporterKind::OtlpGrpc] {
            assert_eq!(kind.to_string().parse::<ExporterKind>(), Ok(kind));
        }
    }
}
