use anyhow::Context;
use onboarding_buddy::http::HttpServer;
use onboarding_buddy::{build_services, logging, AppConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing("info");

    let config = AppConfig::load().context("loading configuration")?;
    info!("Onboarding Buddy v{}", onboarding_buddy::version());

    let services = build_services(&config).await.context("building backend clients")?;

    if config.ingest.on_startup {
        match services.ingest(&config.ingest.documents_dir).await {
            Ok(report) => info!(uploaded = report.uploaded, "startup ingestion finished"),
            Err(e) => warn!(error = %e, "startup ingestion failed; serving existing vectors"),
        }
    }

    let server = HttpServer::new(services.app_state(), config.server.address.clone(), config.server.port);
    server.start().await.context("HTTP server")?;
    Ok(())
}
