// Unit tests for payload serialization and sealing

use crate::common::test_material;
use like_relay::core::crypto::decrypt;
use like_relay::core::models::{Action, TargetId};
use like_relay::core::payload::{decode_like, seal, serialize, LikeCountRequest};
use prost::Message;

#[test]
fn test_serialize_is_deterministic() {
    let action = Action::Like { target: TargetId::new(123456789) };
    assert_eq!(serialize(&action), serialize(&action));
}

#[test]
fn test_sealed_like_round_trips() {
    let action = Action::Like { target: TargetId::new(123456789) };
    let envelope = seal(&action, &test_material()).unwrap();

    let plaintext = decrypt(&envelope, &test_material()).unwrap();
    assert_eq!(plaintext, serialize(&action));
    assert_eq!(decode_like(&plaintext).unwrap(), TargetId::new(123456789));
}

#[test]
fn test_count_query_carries_uid() {
    let bytes = serialize(&Action::CountQuery { target: TargetId::new(987654321) });
    let decoded = LikeCountRequest::decode(bytes.as_slice()).unwrap();
    assert_eq!(decoded.uid, 987654321);
    assert_eq!(decoded.request_source, 1);
}

#[test]
fn test_seal_is_deterministic() {
    let action = Action::CountQuery { target: TargetId::new(42) };
    assert_eq!(
        seal(&action, &test_material()).unwrap(),
        seal(&action, &test_material()).unwrap()
    );
}
