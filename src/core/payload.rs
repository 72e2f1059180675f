// Binary payloads sent to the backend, one protobuf message per action

use crate::core::crypto::{self, KeyMaterial};
use crate::core::errors::CryptoError;
use crate::core::models::{Action, TargetId};
use prost::Message;

/// Request source marker the backend expects on count queries
const COUNT_QUERY_SOURCE: u32 = 1;

/// Body of a like action
#[derive(Clone, PartialEq, Message)]
pub struct LikeRequest {
    #[prost(uint64, tag = "1")]
    pub uid: u64,
}

/// Body of a like-count query
#[derive(Clone, PartialEq, Message)]
pub struct LikeCountRequest {
    #[prost(uint64, tag = "1")]
    pub uid: u64,
    #[prost(uint32, tag = "2")]
    pub request_source: u32,
}

/// Serialize an action into its wire message
pub fn serialize(action: &Action) -> Vec<u8> {
    match action {
        Action::Like { target } => LikeRequest { uid: target.get() }.encode_to_vec(),
        Action::CountQuery { target } => LikeCountRequest {
            uid: target.get(),
            request_source: COUNT_QUERY_SOURCE,
        }
        .encode_to_vec(),
    }
}

/// Serialize and encrypt an action in one step
pub fn seal(action: &Action, material: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
    crypto::encrypt(&serialize(action), material)
}

/// Decode a like body, used when inspecting captured envelopes
pub fn decode_like(bytes: &[u8]) -> Result<TargetId, CryptoError> {
    LikeRequest::decode(bytes)
        .map(|req| TargetId::new(req.uid))
        .map_err(|e| CryptoError::Serialization(e.to_string()))
}
