pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LambdaConfig, TomlConfig};

#[cfg(feature = "lambda")]
pub use adapters::s3::S3Storage;
pub use adapters::storage::LocalStorage;

pub use crate::core::{
    etl::EtlEngine,
    ingest::{HttpRateSource, RawIngestor},
    partition::PartitionWriter,
};
pub use domain::model::{EtlSummary, PartitionKey, RateRow, RateSnapshot};
pub use utils::error::{EtlError, EtlStage, Result};
