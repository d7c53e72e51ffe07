//! Notification loop: turns session notifications into log lines.

use frame_core::{FrameNotification, FrameSession, SessionPhase};

use std::future::Future;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep, timeout};

const SNAPSHOT_POLL: Duration = Duration::from_millis(20);

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    Shutdown,
    SessionClosed,
}

/// One-line, human readable description of a notification.
pub fn describe(notification: &FrameNotification) -> String {
    match notification {
        FrameNotification::ConnectionChanged(true) => "Connected to the TV".to_string(),
        FrameNotification::ConnectionChanged(false) => "Disconnected from the TV".to_string(),
        FrameNotification::DeviceInfoUpdated(info) => format!(
            "Device info: {} ({} fields, Frame TV: {})",
            info.name().unwrap_or("unknown"),
            info.fields().len(),
            info.has_frame_tv_support()
        ),
        FrameNotification::ApiVersion(version) => format!("Art API version {version}"),
        FrameNotification::ArtModeChanged(on) => {
            format!("Art mode {}", if *on { "on" } else { "off" })
        }
        FrameNotification::FavoriteChanged { content_id, status } => {
            format!("Favorite {content_id}: {status}")
        }
        FrameNotification::ContentList(items) => format!("Content list: {} items", items.len()),
        FrameNotification::ThumbnailReady { content_id, path } => {
            format!("Thumbnail for {content_id} saved to {}", path.display())
        }
        FrameNotification::UploadFinished { content_id } => {
            format!("Upload stored as {content_id}")
        }
        FrameNotification::ImagesDeleted(ids) => format!("Deleted: {}", ids.join(", ")),
        FrameNotification::CurrentArtwork {
            content_id,
            matte_id,
            ..
        } => format!("Showing {content_id} (matte {matte_id})"),
        FrameNotification::MatteList { types, colors } => {
            format!("Mattes: {} types, {} colors", types.len(), colors.len())
        }
        FrameNotification::FilterList(filters) => format!("Photo filters: {}", filters.len()),
        FrameNotification::ImageSelected {
            content_id,
            is_shown,
            ..
        } => format!("Selected {content_id} (shown: {is_shown})"),
        FrameNotification::RotationImageChanged { content_id, kind } => {
            format!("Rotation moved to {content_id} ({kind})")
        }
        FrameNotification::DeviceError {
            error_code,
            request,
        } => format!("Device rejected request {request}: error {error_code}"),
        FrameNotification::DiscoveryFailed { message } => format!("Discovery failed: {message}"),
        FrameNotification::TransferFailed { direction, message } => {
            format!("The {direction} failed: {message}")
        }
        FrameNotification::Unauthorized => {
            "The TV refused this client; allow it on the TV and reconnect".to_string()
        }
        FrameNotification::ChannelError { message } => format!("Channel error: {message}"),
        FrameNotification::Raw { event, .. } => format!("Unhandled event '{event}'"),
    }
}

fn log_notification(notification: &FrameNotification) {
    let line = describe(notification);
    match notification {
        FrameNotification::DeviceError { .. }
        | FrameNotification::DiscoveryFailed { .. }
        | FrameNotification::TransferFailed { .. }
        | FrameNotification::ChannelError { .. } => error!("{line}"),
        FrameNotification::Unauthorized => warn!("{line}"),
        FrameNotification::Raw { .. } => debug!("{line}"),
        _ => info!("{line}"),
    }
}

/// Log notifications until `shutdown` resolves or the session goes away.
pub async fn run<F>(mut notifications: Receiver<FrameNotification>, shutdown: F) -> MonitorExit
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return MonitorExit::Shutdown,
            received = notifications.recv() => match received {
                Ok(notification) => log_notification(&notification),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Monitor fell behind, skipped {skipped} notifications");
                }
                Err(RecvError::Closed) => return MonitorExit::SessionClosed,
            },
        }
    }
}

/// Wait until the session reports Disconnected with no open channel.
///
/// Returns `false` if that doesn't happen within `grace`.
pub async fn wait_until_disconnected(session: &FrameSession, grace: Duration) -> bool {
    let settled = async {
        loop {
            let snapshot = session.snapshot().await;
            if snapshot.phase == SessionPhase::Disconnected && !snapshot.is_connected() {
                return;
            }
            sleep(SNAPSHOT_POLL).await;
        }
    };
    timeout(grace, settled).await.is_ok()
}
