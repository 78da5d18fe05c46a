use clap::Parser;
use currency_etl::config::cli::Command;
use currency_etl::core::ConfigProvider;
use currency_etl::utils::error::{ErrorSeverity, EtlError};
use currency_etl::utils::{logger, validation::Validate};
use currency_etl::{CliConfig, EtlEngine, HttpRateSource, LocalStorage, RawIngestor};

async fn execute(cli: &CliConfig) -> Result<(), EtlError> {
    let settings = cli.settings()?;
    settings.validate()?;
    if cli.verbose {
        tracing::debug!("Settings: {:?}", settings.storage);
    }

    let storage = LocalStorage::new(settings.storage.base_path.clone());

    match &cli.command {
        Command::Ingest { save_local } => {
            let source = HttpRateSource::from_config(&settings)?;
            let mut ingestor =
                RawIngestor::new(source, storage).with_raw_prefix(settings.raw_prefix());
            if let Some(dir) = save_local {
                ingestor = ingestor.with_local_copy(dir);
            }

            let key = ingestor.ingest().await?;
            println!("✅ Currency data ingestion successful");
            println!("📁 Raw snapshot saved to: {}", key);
        }
        Command::Transform { source, .. } => {
            let engine = EtlEngine::new_with_monitoring(storage.clone(), storage, cli.monitor)
                .with_output_prefix(settings.output_prefix());

            let summary = engine.run(source).await?;
            println!("✅ Currency data ETL completed successfully!");
            println!("📊 Records processed: {}", summary.row_count);
            for path in &summary.written_paths {
                println!("📁 {}", path);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting currency-etl");

    if let Err(e) = execute(&cli).await {
        tracing::error!(
            "❌ ETL process failed: {} (Category: {:?}, Severity: {:?}, Retryable: {})",
            e,
            e.category(),
            e.severity(),
            e.is_retryable()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
