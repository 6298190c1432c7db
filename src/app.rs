use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::ConfigService;
use crate::interfaces::mock_server::MockServer;

/// Runs the local collaborator endpoints until Ctrl+C.
pub fn run() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "Failed to start tokio runtime");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(serve()) {
        error!(error = %err, "Participant import server stopped with an error");
        std::process::exit(1);
    }
}

async fn serve() -> Result<()> {
    let config = ConfigService::load()?;
    let server = MockServer::start(&config.server).await?;
    let import = server.import_config();
    info!(
        process_url = %import.process_url,
        save_url = %import.save_url,
        csrf_token = %import.csrf_token,
        "Participant import endpoints ready, press Ctrl+C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| AppError::Internal(format!("Failed to listen for Ctrl+C: {}", err)))?;
    server.stop().await;
    Ok(())
}
