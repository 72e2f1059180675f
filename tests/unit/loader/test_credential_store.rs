// Unit tests for the file-backed credential store

use crate::common::{region_table, test_material};
use like_relay::api::CredentialSource;
use like_relay::config::DEFAULT_USER_AGENT;
use like_relay::core::errors::CredentialSourceError;
use like_relay::core::models::Region;
use like_relay::loader::credential_store::JsonCredentialStore;
use std::fs;
use tempfile::TempDir;

fn store(dir: &TempDir) -> JsonCredentialStore {
    JsonCredentialStore::new(dir.path(), region_table(), test_material(), DEFAULT_USER_AGENT)
}

#[tokio::test]
async fn test_region_file_mapping() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    assert_eq!(store.path_for(&Region::new("bd")), dir.path().join("token_bd.json"));
    assert_eq!(store.path_for(&Region::new("ind")), dir.path().join("token_ind.json"));
    // Unmapped regions share the default file
    assert_eq!(store.path_for(&Region::new("br")), dir.path().join("token_bd.json"));
}

#[tokio::test]
async fn test_loads_in_file_order() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("token_ind.json"),
        r#"[{"token": "first"}, {"token": "second"}, {"token": "third"}]"#,
    )
    .unwrap();

    let credentials = store(&dir).load(&Region::new("ind")).await.unwrap();
    assert_eq!(credentials.len(), 3);

    let auth: Vec<String> = credentials
        .iter()
        .map(|c| c.dispatch_headers().authorization())
        .collect();
    assert_eq!(auth, vec!["Bearer first", "Bearer second", "Bearer third"]);
    assert!(credentials.iter().all(|c| c.user_agent() == DEFAULT_USER_AGENT));
    assert!(credentials.iter().all(|c| c.key_material() == &test_material()));
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("token_bd.json"),
        r#"[{"uid": "3942040791", "password": "x", "token": "tok", "region": "BD"}]"#,
    )
    .unwrap();

    let credentials = store(&dir).load(&Region::new("bd")).await.unwrap();
    assert_eq!(credentials.len(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_format_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("token_bd.json"), "[{\"token\": ").unwrap();

    let err = store(&dir).load(&Region::new("bd")).await.unwrap_err();
    assert!(matches!(err, CredentialSourceError::Format { ref path, .. } if path.ends_with("token_bd.json")));
}

#[tokio::test]
async fn test_record_without_token_is_format_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("token_bd.json"), r#"[{"uid": "1"}]"#).unwrap();

    let err = store(&dir).load(&Region::new("bd")).await.unwrap_err();
    assert!(matches!(err, CredentialSourceError::Format { .. }));
}

#[tokio::test]
async fn test_empty_token_is_format_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("token_bd.json"), r#"[{"token": "ok"}, {"token": "  "}]"#).unwrap();

    let err = store(&dir).load(&Region::new("bd")).await.unwrap_err();
    match err {
        CredentialSourceError::Format { reason, .. } => assert!(reason.contains("record 1")),
        other => panic!("expected Format, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_list_is_no_credentials() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("token_bd.json"), "[]").unwrap();

    let err = store(&dir).load(&Region::new("bd")).await.unwrap_err();
    assert_eq!(err, CredentialSourceError::NoCredentials("bd".to_string()));
}

#[tokio::test]
async fn test_bad_key_override_is_format_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("token_bd.json"),
        r#"[{"token": "tok", "key": "0011", "iv": "000102030405060708090a0b0c0d0e0f"}]"#,
    )
    .unwrap();

    let err = store(&dir).load(&Region::new("bd")).await.unwrap_err();
    assert!(matches!(err, CredentialSourceError::Format { .. }));
}

#[tokio::test]
async fn test_reload_sees_file_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token_bd.json");
    let store = store(&dir);

    fs::write(&path, r#"[{"token": "a"}]"#).unwrap();
    assert_eq!(store.load(&Region::new("bd")).await.unwrap().len(), 1);

    fs::write(&path, r#"[{"token": "a"}, {"token": "b"}]"#).unwrap();
    assert_eq!(store.load(&Region::new("bd")).await.unwrap().len(), 2);

    fs::remove_file(&path).unwrap();
    assert!(matches!(
        store.load(&Region::new("bd")).await,
        Err(CredentialSourceError::NotFound { .. })
    ));
}
