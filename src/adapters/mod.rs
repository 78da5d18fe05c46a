// Adapters layer: concrete storage backends behind the `Storage` port.

pub mod storage;

#[cfg(feature = "lambda")]
pub mod s3;
