// Configuration management

use crate::core::crypto::KeyMaterial;
use crate::core::errors::BridgeError;
use crate::core::models::{DispatchShape, Region};
use std::env;
use std::path::{Path, PathBuf};

/// User-agent sent when a credential record does not carry its own
pub const DEFAULT_USER_AGENT: &str = "Dalvik/2.1.0 (Linux; U; Android 9; ASUS_Z01QD Build/PI)";

/// Application configuration loaded from environment variables
///
/// Loaded once at process start and shared read-only afterwards. The region
/// table itself lives in a YAML file pointed to by `regions_yaml_path`.
#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Region and credential sources
    pub regions_yaml_path: PathBuf,
    pub tokens_dir: PathBuf,
    pub default_region: Region,

    // Deployment-wide cipher material; credentials may override it
    pub key_material: KeyMaterial,
    pub default_user_agent: String,

    // Dispatch configuration
    pub dispatch_shape: DispatchShape,
    pub dispatch_timeout_secs: u64,
    pub tls_verify: bool,

    // Middleware configuration
    pub request_timeout_secs: u64,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, BridgeError> {
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            bind_address: Self::get_env_or_default("BIND_ADDRESS", "0.0.0.0"),
            port: Self::parse_port()?,
            regions_yaml_path: Self::get_required_path("REGIONS_YAML_PATH")?,
            tokens_dir: PathBuf::from(Self::get_env_or_default("TOKENS_DIR", "tokens")),
            default_region: Region::new(&Self::get_env_or_default("DEFAULT_REGION", "bd")),
            key_material: Self::parse_key_material()?,
            default_user_agent: Self::get_env_or_default("DEFAULT_USER_AGENT", DEFAULT_USER_AGENT),
            dispatch_shape: Self::parse_dispatch_shape()?,
            dispatch_timeout_secs: Self::parse_u64_or_default("DISPATCH_TIMEOUT_SECS", 10)?,
            tls_verify: Self::parse_bool_or_default("TLS_VERIFY", false)?,
            request_timeout_secs: Self::parse_u64_or_default("REQUEST_TIMEOUT_SECS", 60)?,
            log_level: Self::get_env_or_default("LOG_LEVEL", "info"),
            log_format: Self::get_env_or_default("LOG_FORMAT", "json"),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get environment variable or return default value
    fn get_env_or_default(key: &str, default: &str) -> String {
        match env::var(key) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => default.to_string(),
        }
    }

    /// Get required environment variable
    fn get_required(key: &str) -> Result<String, BridgeError> {
        let value = env::var(key)
            .map_err(|_| BridgeError::Configuration(format!("{} not set", key)))?;

        if value.trim().is_empty() {
            return Err(BridgeError::Configuration(format!("{} is empty", key)));
        }

        Ok(value)
    }

    /// Get required file path from environment variable
    fn get_required_path(key: &str) -> Result<PathBuf, BridgeError> {
        Self::get_required(key).map(PathBuf::from)
    }

    /// Parse port from PORT environment variable
    fn parse_port() -> Result<u16, BridgeError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
        let port = port_str.parse::<u16>()
            .map_err(|e| BridgeError::Configuration(
                format!("Invalid PORT value '{}': {}", port_str, e)
            ))?;

        if port == 0 {
            return Err(BridgeError::Configuration(
                "PORT must be between 1 and 65535".to_string()
            ));
        }

        Ok(port)
    }

    /// Parse AES_KEY / AES_IV hex pair
    fn parse_key_material() -> Result<KeyMaterial, BridgeError> {
        let key_hex = Self::get_required("AES_KEY")?;
        let iv_hex = Self::get_required("AES_IV")?;

        KeyMaterial::from_hex(&key_hex, &iv_hex)
            .map_err(|e| BridgeError::Configuration(format!("Invalid AES_KEY/AES_IV: {}", e)))
    }

    /// Parse DISPATCH_SHAPE
    fn parse_dispatch_shape() -> Result<DispatchShape, BridgeError> {
        Self::get_env_or_default("DISPATCH_SHAPE", "broadcast")
            .parse::<DispatchShape>()
            .map_err(|e| BridgeError::Configuration(format!("Invalid DISPATCH_SHAPE: {}", e)))
    }

    /// Parse u64 from environment variable or return default
    fn parse_u64_or_default(key: &str, default: u64) -> Result<u64, BridgeError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<u64>()
                    .map_err(|e| BridgeError::Configuration(
                        format!("Invalid {} value '{}': {}", key, value, e)
                    ))?;

                if parsed == 0 {
                    return Err(BridgeError::Configuration(
                        format!("{} must be greater than 0", key)
                    ));
                }

                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    /// Parse boolean flag from environment variable or return default
    fn parse_bool_or_default(key: &str, default: bool) -> Result<bool, BridgeError> {
        match env::var(key) {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(BridgeError::Configuration(
                    format!("Invalid {} value '{}': expected true or false", key, value)
                )),
            },
            _ => Ok(default),
        }
    }

    /// Validate all configuration values
    fn validate(&self) -> Result<(), BridgeError> {
        Self::validate_file_path(&self.regions_yaml_path, "Regions YAML file")?;

        if !self.tokens_dir.is_dir() {
            return Err(BridgeError::Configuration(
                format!("Tokens directory not found at {:?}", self.tokens_dir)
            ));
        }

        // Single-account makes two sequential dispatches inside one request
        if self.request_timeout_secs <= 2 * self.dispatch_timeout_secs {
            return Err(BridgeError::Configuration(format!(
                "REQUEST_TIMEOUT_SECS ({}) must exceed twice DISPATCH_TIMEOUT_SECS ({})",
                self.request_timeout_secs, self.dispatch_timeout_secs
            )));
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    /// Validate that a file path exists and is readable
    fn validate_file_path(path: &Path, description: &str) -> Result<(), BridgeError> {
        if !path.is_file() {
            return Err(BridgeError::Configuration(
                format!("{} not found at {:?}", description, path)
            ));
        }

        std::fs::File::open(path)
            .map_err(|e| BridgeError::Configuration(
                format!("Cannot read {} at {:?}: {}", description, path, e)
            ))?;

        Ok(())
    }

    /// Validate log level
    fn validate_log_level(level: &str) -> Result<(), BridgeError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(BridgeError::Configuration(
                format!("Invalid LOG_LEVEL '{}': must be one of {}", level, valid_levels.join(", "))
            ));
        }
        Ok(())
    }

    /// Validate log format
    fn validate_log_format(format: &str) -> Result<(), BridgeError> {
        if format != "json" && format != "text" {
            return Err(BridgeError::Configuration(
                format!("Invalid LOG_FORMAT '{}': must be 'json' or 'text'", format)
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Create a test configuration for unit tests
    ///
    /// This bypasses environment variable loading and file validation.
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            regions_yaml_path: PathBuf::from("/tmp/regions.yaml"),
            tokens_dir: PathBuf::from("/tmp/tokens"),
            default_region: Region::new("bd"),
            key_material: KeyMaterial::new(b"0123456789abcdef".to_vec(), b"fedcba9876543210".to_vec())
                .unwrap_or_else(|e| panic!("static test key material is valid: {}", e)),
            default_user_agent: DEFAULT_USER_AGENT.to_string(),
            dispatch_shape: DispatchShape::Broadcast,
            dispatch_timeout_secs: 10,
            tls_verify: false,
            request_timeout_secs: 60,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}
