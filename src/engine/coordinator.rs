// Fan-out coordinator: broadcast and single-account dispatch shapes

use crate::api::{CredentialSource, DispatchClient};
use crate::core::errors::{BridgeError, CredentialSourceError};
use crate::core::models::{
    Action, BroadcastSummary, Credential, DispatchOutcome, DispatchShape, Region,
    SingleAccountReport, TargetId,
};
use crate::core::payload;
use crate::engine::selector::CredentialSelector;
use crate::loader::region_table::RegionTable;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of one invocation, by shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    Broadcast(BroadcastSummary),
    Single(SingleAccountReport),
}

/// Orchestrates credential loading, envelope sealing and dispatch
///
/// Holds no per-invocation state; credentials are reloaded on every call.
pub struct FanOutCoordinator {
    regions: Arc<RegionTable>,
    credentials: Arc<dyn CredentialSource + Send + Sync>,
    client: Arc<dyn DispatchClient + Send + Sync>,
    selector: Arc<dyn CredentialSelector>,
}

impl FanOutCoordinator {
    pub fn new(
        regions: Arc<RegionTable>,
        credentials: Arc<dyn CredentialSource + Send + Sync>,
        client: Arc<dyn DispatchClient + Send + Sync>,
        selector: Arc<dyn CredentialSelector>,
    ) -> Self {
        Self {
            regions,
            credentials,
            client,
            selector,
        }
    }

    /// Run the configured shape
    pub async fn run(
        &self,
        shape: DispatchShape,
        target: TargetId,
        region: &Region,
    ) -> Result<InvocationResult, BridgeError> {
        match shape {
            DispatchShape::Broadcast => self.broadcast(target, region).await.map(InvocationResult::Broadcast),
            DispatchShape::Single => self.single_account(target, region).await.map(InvocationResult::Single),
        }
    }

    /// Send one like per credential of the region, concurrently
    ///
    /// Region and credential-store errors abort before anything is sent.
    /// After that, nothing escalates: encryption failures, transport
    /// failures, non-200 statuses and panicked tasks all count as a like not
    /// sent. `total_tokens` is always the number of credentials loaded.
    pub async fn broadcast(
        &self,
        target: TargetId,
        region: &Region,
    ) -> Result<BroadcastSummary, BridgeError> {
        let like_url: Arc<str> = Arc::from(self.regions.resolve(region)?.like_url.as_str());
        let credentials = self.load_non_empty(region).await?;
        let total_tokens = credentials.len();
        let action = Action::Like { target };
        let started = Instant::now();

        // Detached tasks: dropping this future does not cancel in-flight calls
        let handles: Vec<JoinHandle<(String, DispatchOutcome)>> = credentials
            .into_iter()
            .map(|credential| {
                let client = Arc::clone(&self.client);
                let url = Arc::clone(&like_url);
                tokio::spawn(async move {
                    let outcome = seal_and_send(client.as_ref(), &url, &action, &credential).await;
                    (credential.fingerprint().to_string(), outcome)
                })
            })
            .collect();

        let mut likes_sent = 0;
        for handle in handles {
            match handle.await {
                Ok((fingerprint, outcome)) if outcome.is_success() => {
                    likes_sent += 1;
                    debug!(credential = %fingerprint, "Like delivered");
                }
                Ok((fingerprint, DispatchOutcome::Completed { status, .. })) => {
                    debug!(credential = %fingerprint, status, "Like rejected by backend");
                }
                Ok((fingerprint, DispatchOutcome::Failed { reason })) => {
                    warn!(credential = %fingerprint, reason = %reason, "Like dispatch failed");
                }
                Err(e) => {
                    warn!(error = %e, "Dispatch task aborted");
                }
            }
        }

        info!(
            uid = %target,
            server = %region,
            likes_sent,
            total_tokens,
            elapsed_ms = started.elapsed().as_millis(),
            "Broadcast completed"
        );

        Ok(BroadcastSummary {
            uid: target,
            server: region.clone(),
            likes_sent,
            total_tokens,
        })
    }

    /// Send a like, then a count query, each with a selected credential
    ///
    /// The two calls are sequential and any failure aborts the rest: the
    /// count query is never sent if the like could not be delivered. A call
    /// already started finishes even if this future is dropped. A
    /// completed exchange counts as delivered whatever its status.
    pub async fn single_account(
        &self,
        target: TargetId,
        region: &Region,
    ) -> Result<SingleAccountReport, BridgeError> {
        let endpoints = self.regions.resolve(region)?;
        let info_url = endpoints.info_url.as_deref().ok_or_else(|| {
            BridgeError::Configuration(format!("no info_url configured for region '{}'", region))
        })?;

        let credentials = self.load_non_empty(region).await?;

        let liker = self.select(&credentials)?;
        let (like_status, _) = self
            .dispatch_strict(&endpoints.like_url, &Action::Like { target }, liker)
            .await?;

        let querier = self.select(&credentials)?;
        let (count_status, count_body) = self
            .dispatch_strict(info_url, &Action::CountQuery { target }, querier)
            .await?;

        info!(
            uid = %target,
            server = %region,
            like_status,
            count_status,
            like_credential = %liker.fingerprint(),
            count_credential = %querier.fingerprint(),
            "Single-account dispatch completed"
        );

        Ok(SingleAccountReport {
            uid: target,
            server: region.clone(),
            timestamp: chrono::Utc::now().timestamp(),
            like_status,
            count_status,
            count_body,
        })
    }

    /// Load credentials, treating an empty set as a store error
    async fn load_non_empty(&self, region: &Region) -> Result<Vec<Credential>, BridgeError> {
        let credentials = self.credentials.load(region).await?;
        if credentials.is_empty() {
            return Err(CredentialSourceError::NoCredentials(region.to_string()).into());
        }
        Ok(credentials)
    }

    fn select<'a>(&self, credentials: &'a [Credential]) -> Result<&'a Credential, BridgeError> {
        let index = self.selector.pick(credentials.len());
        credentials.get(index).ok_or_else(|| {
            BridgeError::Configuration(format!(
                "credential selector returned index {} for {} credentials",
                index,
                credentials.len()
            ))
        })
    }

    /// Seal and send, turning every failure into an error
    async fn dispatch_strict(
        &self,
        url: &str,
        action: &Action,
        credential: &Credential,
    ) -> Result<(u16, Option<Vec<u8>>), BridgeError> {
        let envelope = payload::seal(action, credential.key_material())?;

        // The call runs on its own task so it completes even if the caller goes away
        let client = Arc::clone(&self.client);
        let url = url.to_string();
        let headers = credential.dispatch_headers();
        let outcome = tokio::spawn(async move { client.send(&url, envelope, &headers).await })
            .await
            .unwrap_or_else(|e| DispatchOutcome::failed(format!("dispatch task aborted: {}", e)));

        match outcome {
            DispatchOutcome::Completed { status, body } => Ok((status, body)),
            DispatchOutcome::Failed { reason } => {
                warn!(
                    action = action.kind(),
                    credential = %credential.fingerprint(),
                    reason = %reason,
                    "Dispatch failed"
                );
                Err(BridgeError::Network(reason))
            }
        }
    }
}

/// Seal an action for one credential and send it; encryption failures become
/// failed outcomes
async fn seal_and_send(
    client: &(dyn DispatchClient + Send + Sync),
    url: &str,
    action: &Action,
    credential: &Credential,
) -> DispatchOutcome {
    match payload::seal(action, credential.key_material()) {
        Ok(envelope) => client.send(url, envelope, &credential.dispatch_headers()).await,
        Err(e) => DispatchOutcome::failed(format!("encryption failed: {}", e)),
    }
}
