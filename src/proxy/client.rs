// HTTPS client relaying encrypted envelopes to the backend

use crate::api::DispatchClient;
use crate::core::errors::BridgeError;
use crate::core::models::{DispatchHeaders, DispatchOutcome};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Content type the backend expects for protobuf envelopes
pub const ENVELOPE_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP client for backend dispatch
///
/// One client is built per process and reused across invocations for
/// connection pooling. Certificate verification follows `tls_verify`; the
/// backend serves certificates that do not validate, so deployments usually
/// run with it off.
pub struct DispatchClientImpl {
    http_client: Client,
    timeout: Duration,
}

impl DispatchClientImpl {
    /// Create a new DispatchClient
    ///
    /// # Arguments
    /// * `timeout_secs` - Per-call timeout in seconds
    /// * `tls_verify` - Verify backend certificates
    pub fn new(timeout_secs: u64, tls_verify: bool) -> Result<Self, BridgeError> {
        let timeout = Duration::from_secs(timeout_secs);
        let connect_timeout = Duration::from_secs(5).min(timeout);

        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(!tls_verify)
            .build()
            .map_err(|e| BridgeError::Configuration(format!(
                "Failed to create HTTP client: {}", e
            )))?;

        if !tls_verify {
            warn!("TLS certificate verification is disabled for backend dispatch");
        }

        Ok(Self { http_client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Map a transport error to a failure reason
    fn describe_error(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("request timeout after {}s", self.timeout.as_secs())
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            format!("HTTP request failed: {}", e)
        }
    }
}

#[async_trait]
impl DispatchClient for DispatchClientImpl {
    async fn send(
        &self,
        endpoint: &str,
        envelope: Vec<u8>,
        headers: &DispatchHeaders,
    ) -> DispatchOutcome {
        let started = Instant::now();
        let envelope_len = envelope.len();

        let response = self
            .http_client
            .post(endpoint)
            .header(AUTHORIZATION, headers.authorization())
            .header(CONTENT_TYPE, ENVELOPE_CONTENT_TYPE)
            .header(USER_AGENT, headers.user_agent.as_str())
            .header(ACCEPT, "*/*")
            .body(envelope)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let reason = self.describe_error(&e);
                debug!(
                    url = %endpoint,
                    elapsed_ms = started.elapsed().as_millis(),
                    reason = %reason,
                    "Dispatch failed at transport level"
                );
                return DispatchOutcome::failed(reason);
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                // Status already arrived; keep it and drop the body
                warn!(url = %endpoint, status, error = %e, "Failed to read dispatch response body");
                None
            }
        };

        debug!(
            url = %endpoint,
            status,
            envelope_bytes = envelope_len,
            elapsed_ms = started.elapsed().as_millis(),
            "Dispatch completed"
        );

        DispatchOutcome::Completed { status, body }
    }
}
