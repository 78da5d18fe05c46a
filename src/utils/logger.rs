use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

pub fn init_cli_logger(verbose: bool) {
    let filter = if verbose {
        env_filter("currency_etl=debug,info")
    } else {
        env_filter("currency_etl=info,warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON lines for CloudWatch.
pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter("currency_etl=info,lambda=info,ingest_lambda=info,warn"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .json(),
        )
        .init();
}
