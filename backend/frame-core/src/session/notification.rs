use crate::discovery::DeviceInfo;
use crate::transfer::TransferDirection;

use std::path::PathBuf;

use serde_json::Value;

/// Everything the session reports to its subscribers.
///
/// Device replies and pushes are delivered as they arrive; failures that
/// callers cannot act on synchronously (discovery, transfers, channel
/// errors) are delivered here too instead of being returned.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameNotification {
    ConnectionChanged(bool),
    /// The whole device-info cache after a merge.
    DeviceInfoUpdated(DeviceInfo),
    ApiVersion(String),
    ArtModeChanged(bool),
    FavoriteChanged {
        content_id: String,
        status: bool,
    },
    ContentList(Vec<Value>),
    ThumbnailReady {
        content_id: String,
        path: PathBuf,
    },
    /// An upload was stored on the device.
    UploadFinished {
        content_id: String,
    },
    ImagesDeleted(Vec<String>),
    CurrentArtwork {
        content_id: String,
        matte_id: String,
        portrait_matte_id: String,
    },
    MatteList {
        types: Vec<Value>,
        colors: Vec<Value>,
    },
    FilterList(Vec<Value>),
    ImageSelected {
        content_id: String,
        matte_id: String,
        is_shown: String,
    },
    RotationImageChanged {
        content_id: String,
        kind: String,
    },
    /// The device rejected a request.
    DeviceError {
        error_code: String,
        request: Value,
    },
    DiscoveryFailed {
        message: String,
    },
    TransferFailed {
        direction: TransferDirection,
        message: String,
    },
    Unauthorized,
    ChannelError {
        message: String,
    },
    /// An event this client does not interpret.
    Raw {
        event: String,
        data: Value,
    },
}
