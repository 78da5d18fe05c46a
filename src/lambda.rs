use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use currency_etl::config::lambda::{LambdaConfig, S3Event};
use currency_etl::core::ConfigProvider;
use currency_etl::utils::{logger, validation::Validate};
use currency_etl::{EtlEngine, S3Storage};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

#[derive(Serialize)]
struct ResponseBody<'a> {
    message: &'a str,
    source_file: &'a str,
    records_processed: usize,
    files_created: &'a [String],
}

async fn function_handler(event: LambdaEvent<S3Event>) -> Result<Response, Error> {
    let (bucket, key) = event.payload.source_object()?;
    tracing::info!("Processing file: {} from bucket: {}", key, bucket);

    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let storage = S3Storage::new(S3Client::from_conf(config), bucket);

    // 原始 JSON 與 Parquet 輸出放在同一個 bucket
    let engine = EtlEngine::new(storage.clone(), storage)
        .with_output_prefix(lambda_config.output_prefix());

    let summary = engine.run(&key).await.map_err(|e| {
        tracing::error!(
            "ETL process failed: {} (retryable: {})",
            e,
            e.is_retryable()
        );
        e
    })?;

    let body = serde_json::to_string(&ResponseBody {
        message: "Currency data ETL completed successfully",
        source_file: &key,
        records_processed: summary.row_count,
        files_created: &summary.written_paths,
    })?;

    Ok(Response {
        status_code: 200,
        body,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
