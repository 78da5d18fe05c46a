//! Parquet encoding/decoding for partition artifacts.
//!
//! One artifact holds all rows of a single (year, month, day) partition in a
//! single row group. Column names and types are the contract for analytics
//! readers; keep them stable.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{Array as _, Float64Array, Int32Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;

use crate::domain::model::RateRow;
use crate::utils::error::{EtlError, Result};

fn rate_rows_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("timestamp", DataType::Utf8, false),
        Field::new("base_currency", DataType::Utf8, false),
        Field::new("target_currency", DataType::Utf8, false),
        Field::new("exchange_rate", DataType::Float64, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::UInt32, false),
        Field::new("day", DataType::UInt32, false),
        Field::new("hour", DataType::UInt32, false),
    ]))
}

/// Returns the artifact schema.
#[must_use]
pub fn rate_row_schema() -> Schema {
    (*rate_rows_schema()).clone()
}

fn writer_properties() -> WriterProperties {
    let created_by = KeyValue {
        key: "created_by".to_string(),
        value: Some("currency-etl".to_string()),
    };
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_key_value_metadata(Some(vec![created_by]))
        .build()
}

fn columnar_error(context: &str, e: impl std::fmt::Display) -> EtlError {
    EtlError::ColumnarError {
        message: format!("{context}: {e}"),
    }
}

/// Serializes rows into one Parquet file.
///
/// Output is deterministic for identical input, so rewriting a partition
/// produces byte-identical content.
///
/// # Errors
///
/// Returns an error if the record batch cannot be built or the Parquet write
/// fails.
pub fn encode_rows(rows: &[RateRow]) -> Result<Bytes> {
    let schema = rate_rows_schema();

    let dates = StringArray::from(rows.iter().map(|r| r.date.as_str()).collect::<Vec<_>>());
    let timestamps =
        StringArray::from(rows.iter().map(|r| r.timestamp.as_str()).collect::<Vec<_>>());
    let bases = StringArray::from(
        rows.iter()
            .map(|r| r.base_currency.as_str())
            .collect::<Vec<_>>(),
    );
    let targets = StringArray::from(
        rows.iter()
            .map(|r| r.target_currency.as_str())
            .collect::<Vec<_>>(),
    );
    let rates = Float64Array::from(rows.iter().map(|r| r.exchange_rate).collect::<Vec<_>>());
    let years = Int32Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>());
    let months = UInt32Array::from(rows.iter().map(|r| r.month).collect::<Vec<_>>());
    let days = UInt32Array::from(rows.iter().map(|r| r.day).collect::<Vec<_>>());
    let hours = UInt32Array::from(rows.iter().map(|r| r.hour).collect::<Vec<_>>());

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(dates),
            Arc::new(timestamps),
            Arc::new(bases),
            Arc::new(targets),
            Arc::new(rates),
            Arc::new(years),
            Arc::new(months),
            Arc::new(days),
            Arc::new(hours),
        ],
    )
    .map_err(|e| columnar_error("record batch build failed", e))?;

    let mut cursor = Cursor::new(Vec::<u8>::new());
    let mut writer = ArrowWriter::try_new(&mut cursor, schema, Some(writer_properties()))
        .map_err(|e| columnar_error("parquet writer init failed", e))?;
    writer
        .write(&batch)
        .map_err(|e| columnar_error("parquet write failed", e))?;
    writer
        .close()
        .map_err(|e| columnar_error("parquet close failed", e))?;

    Ok(Bytes::from(cursor.into_inner()))
}

fn read_batches(bytes: &Bytes) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes.clone())
        .map_err(|e| columnar_error("parquet reader init failed", e))?
        .build()
        .map_err(|e| columnar_error("parquet reader build failed", e))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.map_err(|e| columnar_error("parquet read batch failed", e))?);
    }
    Ok(batches)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|e| columnar_error(&format!("missing column '{name}'"), e))?;

    batch
        .column(idx)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| EtlError::ColumnarError {
            message: format!(
                "column '{name}' has unexpected type {}",
                batch.column(idx).data_type()
            ),
        })
}

/// Reads rows back from a Parquet artifact.
///
/// # Errors
///
/// Returns an error if the payload is not valid Parquet or a required column
/// is missing or mistyped.
pub fn decode_rows(bytes: &Bytes) -> Result<Vec<RateRow>> {
    let mut out = Vec::new();
    for batch in read_batches(bytes)? {
        let dates = column::<StringArray>(&batch, "date")?;
        let timestamps = column::<StringArray>(&batch, "timestamp")?;
        let bases = column::<StringArray>(&batch, "base_currency")?;
        let targets = column::<StringArray>(&batch, "target_currency")?;
        let rates = column::<Float64Array>(&batch, "exchange_rate")?;
        let years = column::<Int32Array>(&batch, "year")?;
        let months = column::<UInt32Array>(&batch, "month")?;
        let days = column::<UInt32Array>(&batch, "day")?;
        let hours = column::<UInt32Array>(&batch, "hour")?;

        for row in 0..batch.num_rows() {
            out.push(RateRow {
                date: dates.value(row).to_string(),
                timestamp: timestamps.value(row).to_string(),
                base_currency: bases.value(row).to_string(),
                target_currency: targets.value(row).to_string(),
                exchange_rate: rates.value(row),
                year: years.value(row),
                month: months.value(row),
                day: days.value(row),
                hour: hours.value(row),
            });
        }
    }
    Ok(out)
}
