use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Object storage collaborator: `get`/`put` of whole objects by key.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn raw_prefix(&self) -> &str;
    fn output_prefix(&self) -> &str;
    fn request_timeout(&self) -> Duration;
}

/// Upstream rate feed.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>>;
}
