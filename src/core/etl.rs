use crate::core::{expander, parser, partition::PartitionWriter};
use crate::domain::model::EtlSummary;
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, EtlStage, Result};
use crate::utils::monitor::RunMonitor;

pub use crate::core::partition::DEFAULT_OUTPUT_PREFIX;

/// Runs fetch → parse → expand → write for one source object.
///
/// Storage handles are injected so the engine never touches global clients.
/// `source` and `destination` may point at the same bucket.
pub struct EtlEngine<S: Storage, D: Storage> {
    source: S,
    destination: D,
    output_prefix: String,
    monitor_enabled: bool,
}

impl<S: Storage, D: Storage> EtlEngine<S, D> {
    pub fn new(source: S, destination: D) -> Self {
        Self {
            source,
            destination,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            monitor_enabled: false,
        }
    }

    pub fn new_with_monitoring(source: S, destination: D, monitor_enabled: bool) -> Self {
        Self {
            monitor_enabled,
            ..Self::new(source, destination)
        }
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    /// Any stage failure aborts the remaining stages and comes back tagged
    /// with its [`EtlStage`]. Nothing is retried here.
    pub async fn run(&self, source_key: &str) -> Result<EtlSummary> {
        let mut monitor = RunMonitor::new(self.monitor_enabled);
        tracing::info!("Processing file: {}", source_key);

        tracing::debug!("Stage: {}", EtlStage::Fetching);
        let raw = self
            .source
            .read_file(source_key)
            .await
            .map_err(|e| {
                EtlError::ReadFailure {
                    path: source_key.to_string(),
                    source: Box::new(e),
                }
                .at_stage(EtlStage::Fetching)
            })?;
        monitor.mark("fetching");

        tracing::debug!("Stage: {} ({} bytes)", EtlStage::Parsing, raw.len());
        let snapshot = parser::parse(&raw).map_err(|e| e.at_stage(EtlStage::Parsing))?;
        monitor.mark("parsing");

        tracing::debug!("Stage: {}", EtlStage::Expanding);
        let rows = expander::expand(&snapshot);
        tracing::info!(
            "Expanded {} rows for base {} at {}",
            rows.len(),
            snapshot.base_currency(),
            snapshot.timestamp()
        );
        monitor.mark("expanding");

        tracing::debug!("Stage: {}", EtlStage::Writing);
        let writer = PartitionWriter::new(&self.destination, self.output_prefix.as_str());
        let written_paths = writer
            .write(&rows)
            .await
            .map_err(|e| e.at_stage(EtlStage::Writing))?;
        monitor.mark("writing");
        monitor.log_final_stats();

        tracing::info!(
            "ETL completed: {} rows, {} file(s) written",
            rows.len(),
            written_paths.len()
        );

        Ok(EtlSummary {
            row_count: rows.len(),
            written_paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_writes: bool,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .try_lock()
                .unwrap()
                .insert(path.to_string(), data.as_bytes().to_vec());
            storage
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| EtlError::NotFound {
                path: path.to_string(),
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if self.fail_writes {
                return Err(EtlError::StorageError {
                    message: "access denied".to_string(),
                });
            }
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    const SOURCE_KEY: &str = "currency_data/2023-11-14/2023-11-14_22-13-20_currencies.json";

    #[tokio::test]
    async fn test_run_writes_partition_and_reports_rows() {
        let source = MockStorage::with_file(
            SOURCE_KEY,
            r#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":0.92,"GBP":0.80}}"#,
        );
        let destination = MockStorage::default();
        let engine = EtlEngine::new(source, destination.clone());

        let summary = engine.run(SOURCE_KEY).await.unwrap();

        assert_eq!(summary.row_count, 2);
        assert_eq!(
            summary.written_paths,
            vec!["processed_data/year=2023/month=11/day=14/currency_rates_22.parquet"]
        );
        assert!(destination
            .files
            .lock()
            .await
            .contains_key(&summary.written_paths[0]));
    }

    #[tokio::test]
    async fn test_missing_source_fails_in_fetching_stage() {
        let engine = EtlEngine::new(MockStorage::default(), MockStorage::default());

        let err = engine.run("currency_data/missing.json").await.unwrap_err();

        assert_eq!(err.stage(), Some(EtlStage::Fetching));
        assert!(err.is_retryable());
        assert!(matches!(err.root_cause(), EtlError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_source_writes_nothing() {
        let source = MockStorage::with_file(
            SOURCE_KEY,
            r#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14"}"#,
        );
        let destination = MockStorage::default();
        let engine = EtlEngine::new(source, destination.clone());

        let err = engine.run(SOURCE_KEY).await.unwrap_err();

        assert_eq!(err.stage(), Some(EtlStage::Parsing));
        assert!(!err.is_retryable());
        assert!(destination.files.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_tagged_with_writing_stage() {
        let source = MockStorage::with_file(
            SOURCE_KEY,
            r#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":0.92}}"#,
        );
        let destination = MockStorage {
            fail_writes: true,
            ..MockStorage::default()
        };
        let engine = EtlEngine::new(source, destination);

        let err = engine.run(SOURCE_KEY).await.unwrap_err();

        assert_eq!(err.stage(), Some(EtlStage::Writing));
        assert!(err.is_retryable());
        match &err {
            EtlError::Stage { source, .. } => {
                assert!(matches!(**source, EtlError::WriteFailure { .. }))
            }
            other => panic!("expected stage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_output_prefix() {
        let source = MockStorage::with_file(
            SOURCE_KEY,
            r#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":0.92}}"#,
        );
        let engine = EtlEngine::new_with_monitoring(source, MockStorage::default(), true)
            .with_output_prefix("analytics/fx");

        let summary = engine.run(SOURCE_KEY).await.unwrap();

        assert_eq!(
            summary.written_paths,
            vec!["analytics/fx/year=2023/month=11/day=14/currency_rates_22.parquet"]
        );
    }
}
