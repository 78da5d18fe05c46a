use crate::core::columnar::encode_rows;
use crate::domain::model::{PartitionKey, RateRow};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::collections::BTreeMap;

pub const DEFAULT_OUTPUT_PREFIX: &str = "processed_data";

/// Groups rows by (year, month, day) and writes one Parquet artifact per group.
pub struct PartitionWriter<'a, S: Storage> {
    storage: &'a S,
    prefix: String,
}

impl<'a, S: Storage> PartitionWriter<'a, S> {
    pub fn new(storage: &'a S, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    /// Writes every partition in ascending key order and returns the written paths.
    ///
    /// The artifact's hour suffix comes from the first row of its group in
    /// input order. Existing artifacts at the same path are overwritten.
    /// A failed storage write stops the run; artifacts written before it stay
    /// in place and are listed in the returned [`EtlError::WriteFailure`].
    /// Encoding failures come back as [`EtlError::ColumnarError`].
    pub async fn write(&self, rows: &[RateRow]) -> Result<Vec<String>> {
        let groups = group_by_partition(rows);
        let mut written = Vec::with_capacity(groups.len());

        for (key, group) in groups {
            // group 不會是空的：每個 key 都是由至少一列建立
            let hour = group[0].hour;
            let path = key.artifact_path(&self.prefix, hour);

            let owned: Vec<RateRow> = group.into_iter().cloned().collect();
            // 編碼失敗是確定性的，不包成 WriteFailure
            let data = encode_rows(&owned)?;

            tracing::debug!("Writing {} rows ({} bytes) to {}", owned.len(), data.len(), path);
            if let Err(e) = self.storage.write_file(&path, &data).await {
                tracing::error!("Failed to write partition {}: {}", path, e);
                return Err(write_failure(path, written, e));
            }

            tracing::info!("Written Parquet file: {}", path);
            written.push(path);
        }

        Ok(written)
    }
}

fn write_failure(path: String, written: Vec<String>, source: EtlError) -> EtlError {
    EtlError::WriteFailure {
        path,
        written,
        source: Box::new(source),
    }
}

/// Builds the key → rows mapping. Rows keep their input order within a group.
pub fn group_by_partition(rows: &[RateRow]) -> BTreeMap<PartitionKey, Vec<&RateRow>> {
    let mut groups: BTreeMap<PartitionKey, Vec<&RateRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.partition_key()).or_default().push(row);
    }
    groups
}
