use crate::collectors::registry::CollectorRegistry;
use crate::docker::DockerClient;
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error};

pub async fn metrics(
    Extension(client): Extension<Arc<DockerClient>>,
    Extension(registry): Extension<Arc<CollectorRegistry>>,
) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );

    match registry.run_cycle(&client).await {
        Ok(metrics) => {
            debug!("Successfully collected metrics");
            (StatusCode::OK, headers, metrics)
        }
        Err(e) => {
            error!("Failed to collect metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                headers,
                format!("Error collecting metrics: {e}"),
            )
        }
    }
}
