use frame_monitor::error::MonitorError;
use frame_monitor::logger::{initialize as LoggerInitialize, level_from_env};
use frame_monitor::monitor::{self, MonitorExit};
use frame_monitor::paths;

use frame_core::FrameSession;
use frame_core::config::EngineConfig;

use std::process::ExitCode;
use std::time::Duration;

use log::{error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), MonitorError> {
    dotenvy::dotenv().ok();

    let paths = paths::resolve()?;
    paths.ensure_exist()?;
    LoggerInitialize(&paths.log_dir, level_from_env())?;

    let mut config = EngineConfig::load(&paths.config_dir)?;
    config.apply_env_overrides();
    config.validate()?;

    let session = FrameSession::new(config.clone())?;
    info!("Session {} started", session.session_id());

    let notifications = session.subscribe();

    if config.target.host.is_empty() {
        warn!("No TV address configured; set FRAME_HOST or target.host in config.json");
    } else {
        session.connect()?;
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    match monitor::run(notifications, shutdown).await {
        MonitorExit::Shutdown => {
            info!("Shutting down");
            session.disconnect()?;
            if !monitor::wait_until_disconnected(&session, SHUTDOWN_GRACE).await {
                warn!("Session did not close within {SHUTDOWN_GRACE:?}");
            }
        }
        MonitorExit::SessionClosed => warn!("Session ended unexpectedly"),
    }

    Ok(())
}
