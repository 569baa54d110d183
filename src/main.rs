// Schema bootstrap, run once per deployment.
//
// Usage: oauth2-pg-store [DATABASE_URL]
// Without an argument the URL comes from `application.conf` or the
// `OAUTH2_STORE_*` environment.

use std::process::ExitCode;

use oauth2_pg_store::{init_telemetry, Config, SERVICE_NAME};

#[tokio::main]
async fn main() -> ExitCode {
    let mut config = Config::default();
    if let Some(url) = std::env::args().nth(1) {
        config = config.with_database_url(url);
    }

    if let Err(e) = init_telemetry(SERVICE_NAME, &config.logging.filter, config.logging.json) {
        eprintln!("failed to initialize logging: {e}");
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }

    let sanitized = config.sanitized();
    tracing::info!(
        database_url = %sanitized.database.url,
        schema = %sanitized.database.schema,
        "bootstrapping schema"
    );

    match oauth2_storage_factory::initialize(&config.database).await {
        Ok(pool) => {
            pool.close().await;
            tracing::info!("schema bootstrap complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "schema bootstrap failed");
            ExitCode::FAILURE
        }
    }
}
