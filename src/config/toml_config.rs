use crate::core::etl::DEFAULT_OUTPUT_PREFIX;
use crate::core::ingest::DEFAULT_RAW_PREFIX;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "http://data.fixer.io/api/latest";
pub const DEFAULT_API_KEY_ENV: &str = "FIXER_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    /// Resolved from the `source.api_key_env` variable, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_path: String,
    pub raw_prefix: String,
    pub output_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: "./data".to_string(),
            raw_prefix: DEFAULT_RAW_PREFIX.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EtlError::ConfigError {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    /// Reads the API key from the environment variable named in `source.api_key_env`.
    pub fn resolve_api_key(mut self) -> Self {
        self.api_key = std::env::var(&self.source.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        self
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn raw_prefix(&self) -> &str {
        &self.storage.raw_prefix
    }

    fn output_prefix(&self) -> &str {
        &self.storage.output_prefix
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("source.endpoint", &self.source.endpoint)?;
        validate_non_empty_string("source.api_key_env", &self.source.api_key_env)?;
        validate_range("source.timeout_seconds", self.source.timeout_seconds, 1, 300)?;
        validate_path("storage.base_path", &self.storage.base_path)?;
        validate_key_prefix("storage.raw_prefix", &self.storage.raw_prefix)?;
        validate_key_prefix("storage.output_prefix", &self.storage.output_prefix)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
