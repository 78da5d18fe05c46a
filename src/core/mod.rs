pub mod columnar;
pub mod etl;
pub mod expander;
pub mod ingest;
pub mod parser;
pub mod partition;

pub use crate::domain::model::{EtlSummary, PartitionKey, RateRow, RateSnapshot};
pub use crate::domain::ports::{ConfigProvider, RateSource, Storage};
pub use crate::utils::error::Result;
