use anyhow::Result;
use safrasphere::config::Config;
use safrasphere::kiosk::{KioskCommand, KioskController};
use safrasphere::logging::{get_logger, init_logging};
use safrasphere::providers::Providers;
use safrasphere::render::LogRenderer;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Logging setup failed: {}", e))?;

    let logger = get_logger("main");
    logger.info(&format!(
        "SafraSphere kiosk {} starting up",
        env!("APP_VERSION")
    ));

    let config = Arc::new(config);
    let simulated = Providers::simulated(&config);
    let mut controller = KioskController::new(Arc::clone(&config), simulated.providers)
        .with_renderer(Arc::new(LogRenderer::new()));
    let handle = controller.handle();

    #[cfg(feature = "web")]
    let web_task = {
        let state = safrasphere::web::AppState::new(
            handle.clone(),
            simulated.feed.clone(),
            Arc::clone(&config),
        );
        let host = config.web.host.clone();
        let port = config.web.port;
        tokio::spawn(async move {
            if let Err(e) = safrasphere::web::serve(state, &host, port).await {
                get_logger("web").error(&format!("Web server error: {}", e));
            }
        })
    };

    // Ctrl-C stops the controller, which releases the camera and timers
    let signal_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_handle.send(KioskCommand::Shutdown);
        }
    });

    let outcome = controller.run().await;

    #[cfg(feature = "web")]
    web_task.abort();

    match outcome {
        Ok(()) => {
            logger.info("Kiosk shutdown complete");
            Ok(())
        }
        Err(e) => {
            logger.error(&format!("Kiosk failed with error: {}", e));
            Err(anyhow::anyhow!("Kiosk error: {}", e))
        }
    }
}
