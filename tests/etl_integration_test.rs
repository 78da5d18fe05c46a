use anyhow::Result;
use bytes::Bytes;
use currency_etl::core::columnar::decode_rows;
use currency_etl::core::{expander, parser, Storage};
use currency_etl::{EtlEngine, EtlError, EtlStage, LocalStorage, PartitionWriter};
use tempfile::TempDir;

const SNAPSHOT_22H: &str = r#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":0.92,"GBP":0.80}}"#;
// 同一個 UTC 日，05:00
const SNAPSHOT_05H: &str = r#"{"base":"USD","timestamp":1699938000,"date":"2023-11-14","rates":{"EUR":0.93,"GBP":0.81,"JPY":150.2}}"#;

async fn seeded_storage(files: &[(&str, &str)]) -> Result<(TempDir, LocalStorage)> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());
    for (key, body) in files {
        storage.write_file(key, body.as_bytes()).await?;
    }
    Ok((temp_dir, storage))
}

#[tokio::test]
async fn test_end_to_end_single_snapshot() -> Result<()> {
    let key = "currency_data/2023-11-14/2023-11-14_22-13-20_currencies.json";
    let (temp_dir, storage) = seeded_storage(&[(key, SNAPSHOT_22H)]).await?;
    let engine = EtlEngine::new(storage.clone(), storage.clone());

    let summary = engine.run(key).await?;

    assert_eq!(summary.row_count, 2);
    assert_eq!(
        summary.written_paths,
        vec!["processed_data/year=2023/month=11/day=14/currency_rates_22.parquet"]
    );
    assert!(temp_dir.path().join(&summary.written_paths[0]).exists());

    let rows = decode_rows(&Bytes::from(storage.read_file(&summary.written_paths[0]).await?))?;
    let mut pairs: Vec<(String, f64)> = rows
        .iter()
        .map(|r| (r.target_currency.clone(), r.exchange_rate))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(pairs, vec![("EUR".to_string(), 0.92), ("GBP".to_string(), 0.80)]);
    assert!(rows.iter().all(|r| r.timestamp == "2023-11-14T22:13:20+00:00"
        && r.base_currency == "USD"
        && r.date == "2023-11-14"));
    Ok(())
}

#[tokio::test]
async fn test_same_day_different_hours_yield_distinct_artifacts() -> Result<()> {
    let (_temp_dir, storage) = seeded_storage(&[]).await?;

    let mut rows = expander::expand(&parser::parse(SNAPSHOT_22H.as_bytes())?);
    rows.extend(expander::expand(&parser::parse(SNAPSHOT_05H.as_bytes())?));

    // 每個快照各自一次呼叫；同一天的列若一起寫入會落在同一個分組
    let writer = PartitionWriter::new(&storage, "processed_data");
    let mut paths = writer.write(&rows[..2]).await?;
    paths.extend(writer.write(&rows[2..]).await?);

    assert_eq!(
        paths,
        vec![
            "processed_data/year=2023/month=11/day=14/currency_rates_22.parquet",
            "processed_data/year=2023/month=11/day=14/currency_rates_05.parquet",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_partitioning_is_lossless_across_days() -> Result<()> {
    let (_temp_dir, storage) = seeded_storage(&[]).await?;
    // 2023-11-15T01:00:00Z
    let next_day = r#"{"base":"USD","timestamp":1700010000,"date":"2023-11-15","rates":{"EUR":0.91,"CHF":0.89}}"#;

    let mut rows = expander::expand(&parser::parse(next_day.as_bytes())?);
    rows.extend(expander::expand(&parser::parse(SNAPSHOT_22H.as_bytes())?));

    let writer = PartitionWriter::new(&storage, "processed_data");
    let paths = writer.write(&rows).await?;

    assert_eq!(
        paths,
        vec![
            "processed_data/year=2023/month=11/day=14/currency_rates_22.parquet",
            "processed_data/year=2023/month=11/day=15/currency_rates_01.parquet",
        ]
    );

    let mut union = Vec::new();
    for path in &paths {
        union.extend(decode_rows(&Bytes::from(storage.read_file(path).await?))?);
    }
    assert_eq!(union.len(), rows.len());
    for row in &rows {
        assert_eq!(union.iter().filter(|r| *r == row).count(), 1);
    }
    Ok(())
}

#[tokio::test]
async fn test_rerun_overwrites_identically() -> Result<()> {
    let key = "currency_data/2023-11-14/2023-11-14_22-13-20_currencies.json";
    let (_temp_dir, storage) = seeded_storage(&[(key, SNAPSHOT_22H)]).await?;
    let engine = EtlEngine::new(storage.clone(), storage.clone());

    let first = engine.run(key).await?;
    let first_bytes = storage.read_file(&first.written_paths[0]).await?;
    let second = engine.run(key).await?;
    let second_bytes = storage.read_file(&second.written_paths[0]).await?;

    assert_eq!(first, second);
    assert_eq!(first_bytes, second_bytes);
    Ok(())
}

#[tokio::test]
async fn test_missing_rates_fails_without_writes() -> Result<()> {
    let key = "currency_data/bad.json";
    let (temp_dir, storage) = seeded_storage(&[(
        key,
        r#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14"}"#,
    )])
    .await?;
    let engine = EtlEngine::new(storage.clone(), storage);

    let err = engine.run(key).await.unwrap_err();

    assert_eq!(err.stage(), Some(EtlStage::Parsing));
    assert!(matches!(err.root_cause(), EtlError::MalformedInput { .. }));
    assert!(!temp_dir.path().join("processed_data").exists());
    Ok(())
}

#[tokio::test]
async fn test_separate_source_and_destination() -> Result<()> {
    let key = "incoming/rates.json";
    let (_source_dir, source) = seeded_storage(&[(key, SNAPSHOT_05H)]).await?;
    let (dest_dir, destination) = seeded_storage(&[]).await?;

    let summary = EtlEngine::new(source, destination)
        .with_output_prefix("fx")
        .run(key)
        .await?;

    assert_eq!(summary.row_count, 3);
    assert!(dest_dir
        .path()
        .join("fx/year=2023/month=11/day=14/currency_rates_05.parquet")
        .exists());
    Ok(())
}
