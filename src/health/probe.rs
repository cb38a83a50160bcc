//! Liveness probing.
//!
//! A probe is a lightweight GET against the content service's health
//! path, used solely to test reachability. It shares nothing with
//! content fetches except the error taxonomy.

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::time;

use crate::config::{HealthCheckConfig, UpstreamConfig};
use crate::error::FetchError;

/// Issues liveness requests against the content service.
pub struct LivenessProbe {
    client: Client<HttpConnector, Body>,
    url: String,
    timeout: Duration,
}

impl LivenessProbe {
    pub fn new(upstream: &UpstreamConfig, health: &HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let url = format!(
            "{}{}",
            upstream.base_url.trim_end_matches('/'),
            upstream.liveness_path
        );

        Self {
            client,
            url,
            timeout: Duration::from_millis(health.probe_timeout_ms),
        }
    }

    /// Probe once. Timeout, connection error, and non-2xx all count as
    /// failure with the detail captured.
    pub async fn check(&self) -> Result<(), FetchError> {
        let request = Request::builder()
            .method("GET")
            .uri(self.url.as_str())
            .header("user-agent", "content-gateway-liveness")
            .body(Body::empty())
            .map_err(|e| FetchError::Permanent(format!("failed to build probe request: {}", e)))?;

        let response_future = self.client.request(request);
        match time::timeout(self.timeout, response_future).await {
            Ok(Ok(response)) => {
                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(FetchError::Transient(format!(
                        "liveness probe returned {}",
                        response.status()
                    )))
                }
            }
            Ok(Err(e)) => Err(FetchError::Transient(format!("liveness probe failed: {}", e))),
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}
