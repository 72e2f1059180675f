// Data models shared across the relay pipeline

use crate::core::crypto::{token_fingerprint, KeyMaterial};
use crate::core::errors::BridgeError;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the profile an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(u64);

impl TargetId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse an inbound `uid` parameter
    ///
    /// Only plain ASCII digits are accepted; signs, whitespace inside the
    /// number and values beyond u64 are rejected.
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BridgeError::Validation("Invalid UID".to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| BridgeError::Validation("Invalid UID".to_string()))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server region code selecting credentials and endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// Normalizes to trimmed lowercase so `BD` and `bd` are the same region
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Action to serialize and relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Like { target: TargetId },
    CountQuery { target: TargetId },
}

impl Action {
    pub fn target(&self) -> TargetId {
        match self {
            Action::Like { target } | Action::CountQuery { target } => *target,
        }
    }

    /// Short name for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Like { .. } => "like",
            Action::CountQuery { .. } => "count_query",
        }
    }
}

/// One account's usable identity
///
/// Immutable once loaded. The token is kept behind `secrecy` so it never ends
/// up in a `Debug` dump; log lines use `fingerprint` instead.
#[derive(Debug)]
pub struct Credential {
    token: Secret<String>,
    key_material: KeyMaterial,
    user_agent: String,
    fingerprint: String,
}

impl Credential {
    pub fn new(token: &str, key_material: KeyMaterial, user_agent: &str) -> Self {
        Self {
            token: Secret::new(token.to_string()),
            fingerprint: token_fingerprint(token),
            key_material,
            user_agent: user_agent.to_string(),
        }
    }

    pub fn key_material(&self) -> &KeyMaterial {
        &self.key_material
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Outbound headers for one call made with this credential
    pub fn dispatch_headers(&self) -> DispatchHeaders {
        DispatchHeaders {
            bearer_token: Secret::new(self.token.expose_secret().clone()),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Per-call header values; the fixed content-type and accept headers are
/// added by the dispatch client
#[derive(Debug)]
pub struct DispatchHeaders {
    pub bearer_token: Secret<String>,
    pub user_agent: String,
}

impl DispatchHeaders {
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.bearer_token.expose_secret())
    }
}

/// Result of one network call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The HTTP exchange completed, whatever the status
    Completed { status: u16, body: Option<Vec<u8>> },
    /// Transport-level failure, or the envelope could not be built
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        DispatchOutcome::Failed { reason: reason.into() }
    }

    /// Only a 200 counts as a delivered action
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { status: 200, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchOutcome::Completed { status, .. } => Some(*status),
            DispatchOutcome::Failed { .. } => None,
        }
    }
}

/// Aggregate of a broadcast invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastSummary {
    pub uid: TargetId,
    pub server: Region,
    pub likes_sent: usize,
    pub total_tokens: usize,
}

/// Result of a single-account invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleAccountReport {
    pub uid: TargetId,
    pub server: Region,
    pub timestamp: i64,
    pub like_status: u16,
    pub count_status: u16,
    /// Raw count-query response, left for an external decoder
    pub count_body: Option<Vec<u8>>,
}

/// Deployment variant of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchShape {
    Broadcast,
    Single,
}

impl FromStr for DispatchShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "broadcast" => Ok(DispatchShape::Broadcast),
            "single" => Ok(DispatchShape::Single),
            other => Err(format!("unknown dispatch shape '{}'", other)),
        }
    }
}

impl fmt::Display for DispatchShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchShape::Broadcast => f.write_str("broadcast"),
            DispatchShape::Single => f.write_str("single"),
        }
    }
}
