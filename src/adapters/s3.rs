use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client as S3Client;

/// One S3 bucket as an object store.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

pub fn content_type_for(path: &str) -> &'static str {
    if path.ends_with(".parquet") {
        "application/x-parquet"
    } else if path.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                GetObjectError::NoSuchKey(_) => EtlError::NotFound {
                    path: format!("s3://{}/{}", self.bucket, path),
                },
                err => EtlError::StorageError {
                    message: format!("Failed to read s3://{}/{}: {}", self.bucket, path, err),
                },
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type_for(path))
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!(
                    "Failed to write s3://{}/{}: {}",
                    self.bucket,
                    path,
                    e.into_service_error()
                ),
            })?;

        tracing::debug!("Stored {} bytes at s3://{}/{}", data.len(), self.bucket, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(
            content_type_for("processed_data/year=2023/month=11/day=14/currency_rates_22.parquet"),
            "application/x-parquet"
        );
        assert_eq!(
            content_type_for("currency_data/2023-11-14/2023-11-14_22-13-20_currencies.json"),
            "application/json"
        );
        assert_eq!(content_type_for("misc.bin"), "application/octet-stream");
    }
}
