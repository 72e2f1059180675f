// Domain error types for the relay pipeline

use thiserror::Error;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Bad or missing inbound parameter (HTTP 400)
    #[error("{0}")]
    Validation(String),

    /// Missing or malformed credential store (HTTP 500)
    #[error("Credential source error: {0}")]
    CredentialSource(#[from] CredentialSourceError),

    /// Bad key material or payload encoding (HTTP 500)
    #[error("Encryption error: {0}")]
    Encryption(#[from] CryptoError),

    /// Transport failure talking to the backend (HTTP 500)
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Credential store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialSourceError {
    /// Region has no endpoint mapping
    #[error("unknown server region '{0}'")]
    UnmappedRegion(String),

    /// Backing file for the region does not exist
    #[error("credential file for region '{region}' not found at {path}")]
    NotFound { region: String, path: String },

    /// Backing file could not be parsed into credentials
    #[error("malformed credential file {path}: {reason}")]
    Format { path: String, reason: String },

    /// Backing file parsed but holds no credentials
    #[error("no credentials available for region '{0}'")]
    NoCredentials(String),
}

/// Payload codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AES key must be 16, 24 or 32 bytes
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// CBC IV must be exactly 16 bytes
    #[error("invalid IV length: expected 16 bytes, got {0}")]
    InvalidIvLength(usize),

    /// Key material was not valid hex
    #[error("failed to decode hex key material: {0}")]
    HexDecode(String),

    /// Ciphertext did not unpad cleanly
    #[error("failed to decrypt envelope: {0}")]
    Decryption(String),

    /// Protobuf message could not be encoded
    #[error("failed to serialize payload: {0}")]
    Serialization(String),
}

impl BridgeError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::Validation(_) => 400,
            BridgeError::CredentialSource(_) => 500,
            BridgeError::Encryption(_) => 500,
            BridgeError::Network(_) => 500,
            BridgeError::Configuration(_) => 500,
        }
    }

    /// Message surfaced to the caller
    ///
    /// Validation messages are returned verbatim; everything else carries the
    /// causing error so operators can tell a bad region from a dead backend.
    pub fn user_message(&self) -> String {
        match self {
            BridgeError::Validation(reason) => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
