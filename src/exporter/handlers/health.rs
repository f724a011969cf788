use crate::docker::DockerClient;
use crate::exporter::GIT_COMMIT_HASH;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    docker: String,
}

// Check docker daemon health
async fn check_daemon_health(client: &DockerClient) -> Result<(), StatusCode> {
    match client.handle().await {
        Ok(docker) => match docker.ping().await {
            Ok(_) => Ok(()),
            Err(error) => {
                error!("Failed to ping docker daemon: {}", error);
                Err(StatusCode::SERVICE_UNAVAILABLE)
            }
        },
        Err(error) => {
            error!("Failed to reach docker daemon: {}", error);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

// Create health struct based on daemon status
fn create_health_response(daemon_result: &Result<(), StatusCode>) -> Health {
    Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docker: if daemon_result.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    }
}

// Create response body based on method
fn create_response_body(method: &Method, health: &Health) -> Body {
    if *method == Method::GET {
        Json(health).into_response().into_body()
    } else {
        Body::empty()
    }
}

// Create X-App header
fn create_app_headers(health: &Health) -> HeaderMap {
    let short_hash = health.commit.get(..7).unwrap_or("");

    let header_value = format!("{}:{}:{}", health.name, health.version, short_hash);

    match header_value.parse::<HeaderValue>() {
        Ok(x_app_header_value) => {
            debug!("X-App header: {:?}", x_app_header_value);
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        }
        Err(err) => {
            debug!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        }
    }
}

// Main axum handler for health
pub async fn health(method: Method, client: Extension<Arc<DockerClient>>) -> impl IntoResponse {
    let daemon_result = check_daemon_health(&client.0).await;
    let health = create_health_response(&daemon_result);
    let body = create_response_body(&method, &health);
    let headers = create_app_headers(&health);

    match daemon_result {
        Ok(()) => {
            debug!("Docker daemon is healthy");
            (StatusCode::OK, headers, body)
        }
        Err(status_code) => {
            debug!("Docker daemon is unhealthy");
            (status_code, headers, body)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_reports_daemon_state() {
        let healthy = create_health_response(&Ok(()));
        assert_eq!(healthy.docker, "ok");
        assert_eq!(healthy.name, env!("CARGO_PKG_NAME"));

        let unhealthy = create_health_response(&Err(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(unhealthy.docker, "error");
    }

    #[test]
    fn test_app_header_contains_name_and_version() {
        let health = create_health_response(&Ok(()));
        let headers = create_app_headers(&health);

        let value = headers.get("X-App").unwrap().to_str().unwrap();
        assert!(value.starts_with(&format!(
            "{}:{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )));
    }

    #[tokio::test]
    async fn test_daemon_health_fails_without_daemon() {
        let client = DockerClient::new("/nonexistent/docker.sock");
        let result = check_daemon_health(&client).await;
        assert_eq!(result, Err(StatusCode::SERVICE_UNAVAILABLE));
    }
}
