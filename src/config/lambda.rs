use crate::core::etl::DEFAULT_OUTPUT_PREFIX;
use crate::core::ingest::DEFAULT_RAW_PREFIX;
use crate::core::ConfigProvider;
use crate::config::toml_config::DEFAULT_API_ENDPOINT;
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    /// Destination bucket for ingest; transform uses the bucket from the event.
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub api_endpoint: String,
    pub api_key: Option<String>,
    pub raw_prefix: String,
    pub output_prefix: String,
    pub request_timeout_seconds: u64,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let request_timeout_seconds = match lookup("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| EtlError::InvalidConfigValueError {
                    field: "REQUEST_TIMEOUT_SECONDS".to_string(),
                    value: raw.clone(),
                    reason: "must be a whole number of seconds".to_string(),
                })?,
            None => 10,
        };

        Ok(Self {
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION").unwrap_or_else(|| "ap-southeast-2".to_string()),
            api_endpoint: lookup("API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            api_key: lookup("API_KEY").filter(|key| !key.trim().is_empty()),
            raw_prefix: lookup("RAW_PREFIX").unwrap_or_else(|| DEFAULT_RAW_PREFIX.to_string()),
            output_prefix: lookup("OUTPUT_PREFIX")
                .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
            request_timeout_seconds,
        })
    }

    pub fn require_bucket(&self) -> Result<&str> {
        self.s3_bucket
            .as_deref()
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "S3_BUCKET".to_string(),
            })
    }
}

impl ConfigProvider for LambdaConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn raw_prefix(&self) -> &str {
        &self.raw_prefix
    }

    fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        if let Some(bucket) = &self.s3_bucket {
            validate_s3_bucket_name("S3_BUCKET", bucket)?;
        }
        validate_aws_region("S3_REGION", &self.s3_region)?;
        validate_url("API_ENDPOINT", &self.api_endpoint)?;
        validate_key_prefix("RAW_PREFIX", &self.raw_prefix)?;
        validate_key_prefix("OUTPUT_PREFIX", &self.output_prefix)?;
        validate_range("REQUEST_TIMEOUT_SECONDS", self.request_timeout_seconds, 1, 300)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

/// S3 put notification, reduced to the fields the handler reads.
#[derive(Debug, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct S3Object {
    pub key: String,
}

impl S3Event {
    /// Bucket and decoded key of the first record.
    pub fn source_object(&self) -> Result<(String, String)> {
        let record = self.records.first().ok_or_else(|| EtlError::MalformedInput {
            message: "S3 event has no records".to_string(),
        })?;
        Ok((
            record.s3.bucket.name.clone(),
            decode_object_key(&record.s3.object.key),
        ))
    }
}

/// Event keys arrive form-encoded (`+` for space, `%XX` escapes).
pub fn decode_object_key(raw: &str) -> String {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{}={}", key, value)
            }
        })
        .next()
        .unwrap_or_default()
}
