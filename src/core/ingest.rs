use crate::core::parser;
use crate::domain::ports::{ConfigProvider, RateSource, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_RAW_PREFIX: &str = "currency_data";

/// Fetches the latest snapshot from a Fixer-style endpoint (`?access_key=`).
pub struct HttpRateSource {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpRateSource {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "api_key".to_string(),
            })?;
        Ok(Self::new(
            config.api_endpoint(),
            api_key,
            config.request_timeout(),
        ))
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("access_key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(EtlError::api)?
            .error_for_status()
            .map_err(EtlError::api)?;

        tracing::debug!("API response status: {}", response.status());
        let body = response.bytes().await.map_err(EtlError::api)?;
        Ok(body.to_vec())
    }
}

/// Fetches one snapshot and stores it untouched as raw JSON.
pub struct RawIngestor<R: RateSource, S: Storage> {
    source: R,
    storage: S,
    raw_prefix: String,
    local_copy_dir: Option<PathBuf>,
}

impl<R: RateSource, S: Storage> RawIngestor<R, S> {
    pub fn new(source: R, storage: S) -> Self {
        Self {
            source,
            storage,
            raw_prefix: DEFAULT_RAW_PREFIX.to_string(),
            local_copy_dir: None,
        }
    }

    pub fn with_raw_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.raw_prefix = prefix.into();
        self
    }

    /// Also keep a pretty-printed copy under `dir`.
    pub fn with_local_copy(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_copy_dir = Some(dir.into());
        self
    }

    pub async fn ingest(&self) -> Result<String> {
        self.ingest_at(Utc::now()).await
    }

    /// Returns the storage key of the stored snapshot.
    pub async fn ingest_at(&self, now: DateTime<Utc>) -> Result<String> {
        let raw = self.source.fetch().await?;

        // API 錯誤回應（例如 access key 無效）不會有 rates，先擋下來
        let snapshot = parser::parse(&raw)?;
        tracing::info!(
            "Fetched {} rates for base {}",
            snapshot.rates().len(),
            snapshot.base_currency()
        );

        let key = raw_object_key(&self.raw_prefix, now);
        self.storage.write_file(&key, &raw).await?;
        tracing::info!("Data successfully stored at {}", key);

        if let Some(dir) = &self.local_copy_dir {
            let value: serde_json::Value = serde_json::from_slice(&raw)?;
            let file_name = sanitize_file_name(&format!("currency_data_{}.json", event_time(now)));
            let path = dir.join(file_name);
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, serde_json::to_string_pretty(&value)?).await?;
            tracing::info!("Data successfully saved to {}", path.display());
        }

        Ok(key)
    }
}

fn event_time(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `<prefix>/<YYYY-MM-DD>/<YYYY-MM-DD_HH-MM-SS>_currencies.json`
pub fn raw_object_key(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}_currencies.json",
        prefix.trim_end_matches('/'),
        now.format("%Y-%m-%d"),
        event_time(now)
    )
}

/// Replaces characters that are invalid in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let re = INVALID.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex"));
    re.replace_all(name, "_").into_owned()
}
