use http::Request;
use tracing::Span;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Configuration for logging.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_target: bool,
    pub include_file: bool,
    pub include_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
            include_file: false,
            include_line: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl From<&str> for LogFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Correlation fields attached to every request span.
#[derive(Debug, Clone)]
pub struct RequestSpan {
    pub request_id: String,
    pub method: String,
    pub path: String,
}

impl RequestSpan {
    pub fn new(request_id: String, method: String, path: String) -> Self {
        Self {
            request_id,
            method,
            path,
        }
    }

    /// Reads the correlation fields off an incoming request. The request id
    /// is expected in `x-request-id`, set by the request-id layer.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        Self::new(
            request_id,
            request.method().to_string(),
            request.uri().path().to_string(),
        )
    }

    pub fn span(&self) -> Span {
        tracing::info_span!(
            "http_request",
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
        )
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init_logging(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let json = (config.format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(config.include_target)
            .with_file(config.include_file)
            .with_line_number(config.include_line)
            .with_span_events(FmtSpan::CLOSE)
    });
    let compact = (config.format == LogFormat::Compact).then(|| {
        fmt::layer()
            .compact()
            .with_target(config.include_target)
            .with_file(config.include_file)
            .with_line_number(config.include_line)
    });
    let pretty = (config.format == LogFormat::Pretty).then(|| {
        fmt::layer()
            .pretty()
            .with_target(config.include_target)
            .with_file(config.include_file)
            .with_line_number(config.include_line)
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(compact)
        .with(pretty)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    }
}

/// Masks currency amounts for logging (shows magnitude only).
pub fn mask_amount(amount: &rust_decimal::Decimal) -> String {
    let abs = amount.abs();
    if abs >= rust_decimal::Decimal::from(1_000_000) {
        "***M+".to_string()
    } else if abs >= rust_decimal::Decimal::from(1_000) {
        "***K+".to_string()
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_amount() {
        use rust_decimal::Decimal;
        assert_eq!(mask_amount(&Decimal::from(500)), "***");
        assert_eq!(mask_amount(&Decimal::from(120_000)), "***K+");
        assert_eq!(mask_amount(&Decimal::from(-2_500_000)), "***M+");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::from("json"), LogFormat::Json);
        assert_eq!(LogFormat::from("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::from("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from("unknown"), LogFormat::Pretty);
    }

    #[test]
    fn test_request_span_reads_request_id_header() {
        let request = Request::builder()
            .method("GET")
            .uri("/reports/business-health?month=2026-09")
            .header("x-request-id", "req-42")
            .body(())
            .unwrap();
        let span = RequestSpan::from_request(&request);
        assert_eq!(span.request_id, "req-42");
        assert_eq!(span.method, "GET");
        assert_eq!(span.path, "/reports/business-health");
    }

    #[test]
    fn test_request_span_without_header() {
        let request = Request::builder().uri("/live").body(()).unwrap();
        assert_eq!(RequestSpan::from_request(&request).request_id, "-");
    }
}
