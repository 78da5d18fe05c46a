use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use currency_etl::config::lambda::LambdaConfig;
use currency_etl::core::ConfigProvider;
use currency_etl::utils::{logger, validation::Validate};
use currency_etl::{HttpRateSource, RawIngestor, S3Storage};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Scheduled trigger; the event payload carries nothing we use.
async fn function_handler(_event: LambdaEvent<serde_json::Value>) -> Result<Response, Error> {
    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;
    let bucket = lambda_config.require_bucket()?.to_string();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let storage = S3Storage::new(S3Client::from_conf(config), bucket);

    let source = HttpRateSource::from_config(&lambda_config)?;
    let key = RawIngestor::new(source, storage)
        .with_raw_prefix(lambda_config.raw_prefix())
        .ingest()
        .await?;

    tracing::info!("Currency data ingestion successful: {}", key);
    Ok(Response {
        status_code: 200,
        body: serde_json::to_string(&serde_json::json!({
            "message": "Currency data ingestion successful",
            "raw_key": key,
        }))?,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
