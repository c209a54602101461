use anyhow::Result;
use tracing::info;

use crate::adapters::http::ApiServer;
use crate::cli::types::ServeArgs;
use crate::infrastructure::AppContext;

/// Handle `pdfchat serve`
pub async fn execute(app: AppContext, args: ServeArgs) -> Result<()> {
    let mut server_config = app.config.server.clone();
    if let Some(host) = args.host {
        server_config.host = host;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }

    ApiServer::new(app, server_config)
        .serve_with_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
