use cg_daemon::{Platform, logging};
use cg_process::EventKind;

use std::error::Error;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load and validate configuration
    let config = cg_config::Config::load()?;
    config.validate()?;

    // Initialize logging (before any other logging)
    logging::initialize(config.logging.level)?;

    info!("Starting craftgate v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let platform = Platform::from_config(&config)?;
    spawn_console_logger(platform.subscribe_server_output());

    if config.game_server.auto_start {
        let outcome = platform.start_server().await;
        if outcome.success {
            info!("{}", outcome.message);
        } else {
            error!("{}", outcome.message);
        }
    }

    if config.public_access.enable_on_start {
        let outcome = platform.enable_public_access(None).await;
        if outcome.success {
            info!("{}", outcome.message);
        } else {
            error!("{}", outcome.message);
        }
    }

    platform.start_health_monitoring();
    info!("Supervisor running, press Ctrl+C to stop");

    shutdown_signal().await;
    platform.shutdown().await;

    Ok(())
}

/// Surface the console events an operator cares about in the daemon log.
fn spawn_console_logger(mut events: broadcast::Receiver<cg_process::ParsedEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match &event.kind {
                    EventKind::PlayerJoin { player } => info!(player = %player, "Player joined"),
                    EventKind::PlayerLeave { player } => info!(player = %player, "Player left"),
                    EventKind::LifecycleReady { startup_time } => {
                        info!(startup_time = %startup_time, "Game server ready")
                    }
                    kind if kind.is_error() => warn!("Game server reported: {}", event.raw),
                    _ => {}
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Console logger lagged, skipped {skipped} events")
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Resolve on SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
