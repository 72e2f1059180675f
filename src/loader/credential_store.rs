// Credential store - loads per-region account credentials from JSON files

use crate::api::CredentialSource;
use crate::core::crypto::KeyMaterial;
use crate::core::errors::CredentialSourceError;
use crate::core::models::{Credential, Region};
use crate::loader::region_table::RegionTable;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// One record of a credential file
///
/// Provisioning tools keep extra fields (account uid, password) next to the
/// token; those are ignored.
#[derive(Debug, Clone, Deserialize)]
struct CredentialRecord {
    token: String,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    iv: Option<String>,
}

/// File-backed credential source
///
/// Re-reads the region's file on every call; nothing is cached between
/// invocations.
pub struct JsonCredentialStore {
    tokens_dir: PathBuf,
    regions: Arc<RegionTable>,
    default_material: KeyMaterial,
    default_user_agent: String,
}

impl JsonCredentialStore {
    pub fn new(
        tokens_dir: impl Into<PathBuf>,
        regions: Arc<RegionTable>,
        default_material: KeyMaterial,
        default_user_agent: &str,
    ) -> Self {
        Self {
            tokens_dir: tokens_dir.into(),
            regions,
            default_material,
            default_user_agent: default_user_agent.to_string(),
        }
    }

    /// Path of the credential file a region resolves to
    pub fn path_for(&self, region: &Region) -> PathBuf {
        self.tokens_dir.join(self.regions.credential_file(region))
    }

    /// Turn parsed records into credentials, applying defaults and overrides
    fn build_credentials(
        &self,
        records: Vec<CredentialRecord>,
        path: &str,
    ) -> Result<Vec<Credential>, CredentialSourceError> {
        let format_err = |reason: String| CredentialSourceError::Format {
            path: path.to_string(),
            reason,
        };

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                if record.token.trim().is_empty() {
                    return Err(format_err(format!("record {} has an empty token", index)));
                }

                let material = match (record.key.as_deref(), record.iv.as_deref()) {
                    (Some(key), Some(iv)) => KeyMaterial::from_hex(key, iv)
                        .map_err(|e| format_err(format!("record {}: {}", index, e)))?,
                    (None, None) => self.default_material.clone(),
                    _ => {
                        return Err(format_err(format!(
                            "record {} must set both key and iv, or neither",
                            index
                        )))
                    }
                };

                let user_agent = record
                    .user_agent
                    .as_deref()
                    .filter(|ua| !ua.trim().is_empty())
                    .unwrap_or(self.default_user_agent.as_str());

                Ok(Credential::new(record.token.trim(), material, user_agent))
            })
            .collect()
    }
}

#[async_trait]
impl CredentialSource for JsonCredentialStore {
    async fn load(&self, region: &Region) -> Result<Vec<Credential>, CredentialSourceError> {
        let path = self.path_for(region);
        let path_str = path.display().to_string();

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => CredentialSourceError::NotFound {
                region: region.to_string(),
                path: path_str.clone(),
            },
            _ => CredentialSourceError::Format {
                path: path_str.clone(),
                reason: e.to_string(),
            },
        })?;

        let records: Vec<CredentialRecord> = serde_json::from_str(&content)
            .map_err(|e| CredentialSourceError::Format {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        if records.is_empty() {
            return Err(CredentialSourceError::NoCredentials(region.to_string()));
        }

        let credentials = self.build_credentials(records, &path_str)?;

        debug!(
            region = %region,
            path = %path_str,
            count = credentials.len(),
            "Credentials loaded"
        );

        Ok(credentials)
    }
}
