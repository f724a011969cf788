use crate::{
    cli::telemetry::shutdown_tracer,
    collectors::{config::CollectorConfig, registry::CollectorRegistry},
    docker::DockerClient,
};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::{Next, from_fn},
    response::Response,
    routing::get,
};
use opentelemetry::global;
use opentelemetry::trace::{TraceContextExt, TraceId};
use opentelemetry_http::HeaderExtractor;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, error, info, info_span, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use ulid::Ulid;

mod handlers;
mod shutdown;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = if let Some(hash) = built_info::GIT_COMMIT_HASH {
    hash
} else {
    ":-("
};

/// Build the router with all routes and middleware wired up.
pub fn app(
    client: Arc<DockerClient>,
    registry: Arc<CollectorRegistry>,
    telemetry_path: &str,
) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(make_span)
        .on_response(on_response);

    Router::new()
        .route("/", get(handlers::landing))
        .route(telemetry_path, get(handlers::metrics))
        .route("/health", get(handlers::health).options(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(trace_layer)
                .layer(from_fn(add_trace_headers))
                .layer(Extension(client))
                .layer(Extension(registry))
                .layer(Extension(handlers::LandingPage::render(telemetry_path))),
        )
}

/// Start the exporter and serve until a shutdown signal arrives.
///
/// The docker daemon being down is not fatal: the exporter starts anyway
/// and reports `docker_up 0` until the daemon comes back.
///
/// # Errors
///
/// Returns an error when the telemetry path is invalid, a collector fails
/// to register its metrics, or the listen address cannot be bound.
pub async fn new(
    port: u16,
    listen: Option<String>,
    telemetry_path: String,
    docker_socket: String,
    config: CollectorConfig,
) -> Result<()> {
    if !telemetry_path.starts_with('/') || telemetry_path == "/" {
        return Err(anyhow!(
            "Invalid telemetry path: '{}'. Expected an absolute path like /metrics",
            telemetry_path
        ));
    }

    let client = Arc::new(DockerClient::new(&docker_socket));

    // Startup reachability probe only; failure is reported, not fatal.
    match client.handle().await {
        Ok(_) => info!(socket = %docker_socket, "docker daemon reachable"),
        Err(e) => warn!(error = %e, "docker daemon unreachable at startup"),
    }

    let registry = Arc::new(CollectorRegistry::new(&config)?);
    let collector_names = registry.collector_names();

    let app = app(client, registry, &telemetry_path);

    let (listener, bind_addr) = match listen {
        Some(addr) => {
            // Try to parse as IpAddr to validate and determine type
            match addr.parse::<std::net::IpAddr>() {
                Ok(ip) => {
                    let bind_addr = format!("{ip}:{port}");
                    (
                        TcpListener::bind(&bind_addr)
                            .await
                            .with_context(|| format!("Failed to bind to {bind_addr}"))?,
                        if ip.is_ipv6() {
                            format!("[{ip}]:{port}")
                        } else {
                            bind_addr.clone()
                        },
                    )
                }
                Err(_) => {
                    return Err(anyhow!(
                        "Invalid IP address: '{}'. Expected IPv4 (e.g., 0.0.0.0, 127.0.0.1) or IPv6 (e.g., ::, ::1)",
                        addr
                    ));
                }
            }
        }
        None => {
            // Auto: try IPv6 first, fallback to IPv4
            match TcpListener::bind(format!("::0:{port}")).await {
                Ok(l) => (l, format!("[::]:{port}")),
                Err(_) => {
                    // If IPv6 fails, fall back to binding to IPv4 address
                    (
                        TcpListener::bind(format!("0.0.0.0:{port}")).await?,
                        format!("0.0.0.0:{port}"),
                    )
                }
            }
        }
    };

    println!(
        "{} {} - Listening on {bind_addr}\n\nEnabled collectors:\n{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        format_list(&collector_names),
    );

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
    {
        error!(error=%e, "server error");
    }

    info!("shutting down");

    shutdown_tracer();

    Ok(())
}

// Helper to format a list of items with a leading dash and indentation for the
// start up message
fn format_list<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| format!("  - {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn make_span(request: &Request<Body>) -> Span {
    let parent_cx =
        global::get_text_map_propagator(|prop| prop.extract(&HeaderExtractor(request.headers())));

    let method = request.method().as_str();

    let path = request.uri().path();

    let target = request.uri().to_string();

    let scheme = request.uri().scheme_str().unwrap_or("http");

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let span = info_span!(
        "http.server.request",
        otel.kind = "server",
        http.method = method,
        http.route = path,
        http.target = target,
        http.scheme = scheme,
        http.user_agent = user_agent,
        request_id = request_id,
    );

    let _ = span.set_parent(parent_cx);

    span
}

fn on_response<B>(response: &axum::http::Response<B>, latency: Duration, span: &Span) {
    if response.status().is_server_error() {
        span.record("otel.status_code", "ERROR");
    } else {
        span.record("otel.status_code", "OK");
    }

    let cx = span.context();
    let trace_id = cx.span().span_context().trace_id();

    if trace_id != TraceId::INVALID {
        info!(
            parent: span,
            status = response.status().as_u16(),
            elapsed_ms = latency.as_millis() as u64,
            trace_id = %trace_id,
            "request completed"
        );
    } else {
        info!(
            parent: span,
            status = response.status().as_u16(),
            elapsed_ms = latency.as_millis() as u64,
            "request completed"
        );
    }
}

async fn add_trace_headers(req: Request<Body>, next: Next) -> Response {
    let mut res = next.run(req).await;

    let span = Span::current();

    let cx = span.context();

    // CLONE the SpanContext to avoid borrowing a temporary
    let span_context = cx.span().span_context().clone();

    if span_context.is_valid()
        && let Ok(val) = HeaderValue::from_str(&span_context.trace_id().to_string())
    {
        res.headers_mut()
            .insert(HeaderName::from_static("x-trace-id"), val);
    }

    res
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_exists() {
        // GIT_COMMIT_HASH is a compile-time constant, either a git hash or ":-("
        assert!(GIT_COMMIT_HASH.len() >= 3);

        let is_hex = GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit());
        let is_fallback = GIT_COMMIT_HASH == ":-(";

        assert!(is_hex || is_fallback);
    }

    #[test]
    fn test_format_list_empty() {
        let items: Vec<String> = vec![];
        assert_eq!(format_list(&items), "");
    }

    #[test]
    fn test_format_list_multiple_items() {
        let items = vec!["status", "stats"];
        assert_eq!(format_list(&items), "  - status\n  - stats");
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_telemetry_path() {
        let result = new(
            0,
            None,
            "metrics".to_string(),
            "/var/run/docker.sock".to_string(),
            CollectorConfig::new(),
        )
        .await;

        assert!(result.is_err());

        let result = new(
            0,
            None,
            "/".to_string(),
            "/var/run/docker.sock".to_string(),
            CollectorConfig::new(),
        )
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_make_span_creates_span() {
        let request = Request::builder()
            .method("GET")
            .uri("/metrics")
            .header("user-agent", "test-client")
            .body(Body::empty())
            .unwrap();

        let span = make_span(&request);

        assert_eq!(
            span.metadata().map(|m| m.name()),
            Some("http.server.request")
        );
    }

    #[test]
    fn test_make_span_without_optional_headers() {
        let request = Request::builder()
            .method("GET")
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let span = make_span(&request);

        assert_eq!(
            span.metadata().map(|m| m.name()),
            Some("http.server.request")
        );
    }

    #[test]
    fn test_on_response_status_codes() {
        use axum::http::{Response, StatusCode};

        let span = info_span!("test");
        let latency = Duration::from_millis(100);

        let response_ok = Response::builder().status(StatusCode::OK).body(()).unwrap();
        on_response(&response_ok, latency, &span);

        let response_err = Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(())
            .unwrap();
        on_response(&response_err, latency, &span);
    }
}
