pub mod channel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod session;
pub mod transfer;
pub mod wake;

mod json_fields;

#[cfg(test)]
mod tests;

pub use session::{FrameNotification, FrameSession, SessionPhase, SessionSnapshot, Target};

/// Port the device serves both its REST API and the control WebSocket on.
pub const DEFAULT_CONTROL_PORT: u16 = 8001;
/// Discard port used for wake datagrams.
pub const DEFAULT_WAKE_PORT: u16 = 9;

pub const REST_API_PATH: &str = "/api/v2/";
pub const ART_APP_CHANNEL: &str = "com.samsung.art-app";
pub const CHANNEL_PATH: &str = const_format::concatcp!(REST_API_PATH, "channels/", ART_APP_CHANNEL);

/// Directory under the system temp dir that receives downloaded thumbnails.
pub const THUMBNAIL_DIR_NAME: &str = "frame-remote";
