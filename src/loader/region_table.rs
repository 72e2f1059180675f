// Region table loading - maps region codes to backend endpoints and credential files

use crate::core::errors::{BridgeError, CredentialSourceError};
use crate::core::models::Region;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Region entry as written in regions.yaml
#[derive(Debug, Clone, Deserialize)]
struct RegionEntry {
    like_url: String,
    #[serde(default)]
    info_url: Option<String>,
    #[serde(default)]
    credential_file: Option<String>,
}

/// Container for regions.yaml root structure
#[derive(Debug, Clone, Deserialize)]
struct RegionsYaml {
    default_credential_file: String,
    regions: HashMap<String, RegionEntry>,
}

/// Backend endpoints for one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEndpoints {
    pub like_url: String,
    pub info_url: Option<String>,
}

/// Immutable region table, loaded once at start
#[derive(Debug, Clone)]
pub struct RegionTable {
    default_credential_file: String,
    endpoints: HashMap<Region, RegionEndpoints>,
    credential_files: HashMap<Region, String>,
}

impl RegionTable {
    /// Load region table from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BridgeError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(BridgeError::Configuration(
                format!("Regions file not found at {:?}", path_ref)
            ));
        }

        let yaml_content = fs::read_to_string(path_ref)
            .map_err(|e| BridgeError::Configuration(
                format!("Failed to read regions file: {}", e)
            ))?;

        Self::from_yaml_str(&yaml_content)
    }

    /// Parse region table from YAML text
    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, BridgeError> {
        let parsed: RegionsYaml = serde_yaml::from_str(yaml_content)
            .map_err(|e| BridgeError::Configuration(
                format!("Failed to parse regions YAML: {}", e)
            ))?;

        if parsed.default_credential_file.trim().is_empty() {
            return Err(BridgeError::Configuration(
                "default_credential_file must not be empty".to_string()
            ));
        }

        let mut endpoints = HashMap::new();
        let mut credential_files = HashMap::new();
        for (code, entry) in parsed.regions {
            let region = Region::new(&code);

            Self::validate_url(&entry.like_url, &region, "like_url")?;
            if let Some(ref info_url) = entry.info_url {
                Self::validate_url(info_url, &region, "info_url")?;
            }

            if let Some(file) = entry.credential_file {
                credential_files.insert(region.clone(), file);
            }
            endpoints.insert(region, RegionEndpoints {
                like_url: entry.like_url,
                info_url: entry.info_url,
            });
        }

        Ok(Self {
            default_credential_file: parsed.default_credential_file,
            endpoints,
            credential_files,
        })
    }

    /// Validate URL format
    fn validate_url(raw: &str, region: &Region, field: &str) -> Result<(), BridgeError> {
        url::Url::parse(raw)
            .map_err(|e| BridgeError::Configuration(
                format!("Invalid {} for region '{}' ('{}'): {}", field, region, raw, e)
            ))?;
        Ok(())
    }

    /// Endpoints for a region; a region without them cannot be served
    pub fn resolve(&self, region: &Region) -> Result<&RegionEndpoints, CredentialSourceError> {
        self.endpoints
            .get(region)
            .ok_or_else(|| CredentialSourceError::UnmappedRegion(region.to_string()))
    }

    /// Credential file name for a region, falling back to the default file
    pub fn credential_file(&self, region: &Region) -> &str {
        self.credential_files
            .get(region)
            .map(String::as_str)
            .unwrap_or(&self.default_credential_file)
    }

    /// All configured regions, sorted
    pub fn regions(&self) -> Vec<Region> {
        let mut regions: Vec<Region> = self.endpoints.keys().cloned().collect();
        regions.sort();
        regions
    }
}
