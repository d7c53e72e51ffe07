//! Outbound art-app requests.
//!
//! Every request travels inside the same transport envelope:
//!
//! ```json
//! {"method":"ms.channel.emit",
//!  "params":{"event":"art_app_request","to":"host","data":"{\"request\":\"get_device_info\",\"id\":\"<session id>\"}"}}
//! ```
//!
//! `data` is a JSON document serialized to a string. The session id is
//! stamped into it at encode time.

use crate::error::channel::ChannelError;

use std::time::SystemTime;

use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

pub const CHANNEL_EMIT_METHOD: &str = "ms.channel.emit";
pub const ART_APP_REQUEST_EVENT: &str = "art_app_request";
pub const EMIT_TARGET: &str = "host";

const SESSION_ID_KEY: &str = "id";
const SOCKET_MODE: &str = "socket";
const DEFAULT_CATEGORY: &str = "None";
const UPLOAD_FILE_TYPE: &str = "jpg";

/// One art-app request, tagged by its `request` name on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "request")]
pub enum ArtCommand {
    #[serde(rename = "get_api_version")]
    GetApiVersion,

    #[serde(rename = "get_device_info")]
    GetDeviceInfo,

    #[serde(rename = "get_artmode_status")]
    GetArtModeStatus,

    #[serde(rename = "set_artmode_status")]
    SetArtModeStatus {
        #[serde(serialize_with = "on_off")]
        value: bool,
    },

    #[serde(rename = "get_content_list")]
    GetContentList { category: String },

    #[serde(rename = "get_current_artwork")]
    GetCurrentArtwork,

    #[serde(rename = "get_matte_list")]
    GetMatteList,

    #[serde(rename = "get_photo_filter_list")]
    GetPhotoFilterList,

    #[serde(rename = "select_image")]
    SelectImage {
        category_id: String,
        content_id: String,
        show: bool,
    },

    #[serde(rename = "change_matte")]
    ChangeMatte {
        content_id: String,
        matte_id: String,
    },

    #[serde(rename = "delete_image_list")]
    DeleteImageList { content_id_list: Vec<ContentRef> },

    #[serde(rename = "get_thumbnail")]
    GetThumbnail {
        content_id: String,
        conn_info: ConnInfo,
    },

    #[serde(rename = "send_image")]
    SendImage {
        file_type: String,
        conn_info: ConnInfo,
        image_date: String,
        matte_id: String,
        file_size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRef {
    pub content_id: String,
}

/// Tells the device how to open the side connection for a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnInfo {
    pub d2d_mode: String,
    pub connection_id: u32,
    pub id: String,
}

impl ConnInfo {
    /// Socket-mode connection info with a fresh random connection id.
    pub fn socket(session_id: &str) -> Self {
        Self {
            d2d_mode: SOCKET_MODE.to_string(),
            connection_id: random_connection_id(),
            id: session_id.to_string(),
        }
    }
}

/// First four bytes of a v4 UUID. The device treats the id as a u32.
fn random_connection_id() -> u32 {
    let [a, b, c, d, ..] = Uuid::new_v4().into_bytes();
    u32::from_be_bytes([a, b, c, d])
}

impl ArtCommand {
    pub fn content_list() -> Self {
        ArtCommand::GetContentList {
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn select_image(content_id: impl Into<String>, category_id: Option<String>) -> Self {
        ArtCommand::SelectImage {
            category_id: category_id.unwrap_or_default(),
            content_id: content_id.into(),
            show: true,
        }
    }

    pub fn delete_image(content_id: impl Into<String>) -> Self {
        ArtCommand::DeleteImageList {
            content_id_list: vec![ContentRef {
                content_id: content_id.into(),
            }],
        }
    }

    pub fn thumbnail(content_id: impl Into<String>, session_id: &str) -> Self {
        ArtCommand::GetThumbnail {
            content_id: content_id.into(),
            conn_info: ConnInfo::socket(session_id),
        }
    }

    /// Announce an upload of `file_size` bytes. The device answers with
    /// `ready_to_use` once it has opened the transfer socket.
    pub fn send_image(file_size: usize, matte_id: impl Into<String>, session_id: &str) -> Self {
        ArtCommand::SendImage {
            file_type: UPLOAD_FILE_TYPE.to_string(),
            conn_info: ConnInfo::socket(session_id),
            image_date: image_date(SystemTime::now()),
            matte_id: matte_id.into(),
            file_size,
        }
    }

    /// Wire name of the request, for logging.
    pub fn request_name(&self) -> &'static str {
        match self {
            ArtCommand::GetApiVersion => "get_api_version",
            ArtCommand::GetDeviceInfo => "get_device_info",
            ArtCommand::GetArtModeStatus => "get_artmode_status",
            ArtCommand::SetArtModeStatus { .. } => "set_artmode_status",
            ArtCommand::GetContentList { .. } => "get_content_list",
            ArtCommand::GetCurrentArtwork => "get_current_artwork",
            ArtCommand::GetMatteList => "get_matte_list",
            ArtCommand::GetPhotoFilterList => "get_photo_filter_list",
            ArtCommand::SelectImage { .. } => "select_image",
            ArtCommand::ChangeMatte { .. } => "change_matte",
            ArtCommand::DeleteImageList { .. } => "delete_image_list",
            ArtCommand::GetThumbnail { .. } => "get_thumbnail",
            ArtCommand::SendImage { .. } => "send_image",
        }
    }
}

#[derive(Serialize)]
struct ChannelEmit<'a> {
    method: &'static str,
    params: EmitParams<'a>,
}

#[derive(Serialize)]
struct EmitParams<'a> {
    event: &'static str,
    to: &'static str,
    data: &'a str,
}

/// Encode `command` as one compact text frame, stamped with `session_id`.
pub fn encode_command(command: &ArtCommand, session_id: &str) -> Result<String, ChannelError> {
    let mut data = serde_json::to_value(command)?;
    let Value::Object(fields) = &mut data else {
        return Err(ChannelError::envelope(format!(
            "{} did not serialize to an object",
            command.request_name()
        )));
    };
    fields.insert(
        SESSION_ID_KEY.to_string(),
        Value::String(session_id.to_string()),
    );

    let data = serde_json::to_string(&data)?;
    let envelope = ChannelEmit {
        method: CHANNEL_EMIT_METHOD,
        params: EmitParams {
            event: ART_APP_REQUEST_EVENT,
            to: EMIT_TARGET,
            data: &data,
        },
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// `YYYY:MM:DD hh:mm:ss` in UTC, the format the device expects for `image_date`.
pub fn image_date(now: SystemTime) -> String {
    // 2026-10-17T08:15:00Z -> 2026:10:17 08:15:00
    let rfc3339 = humantime::format_rfc3339_seconds(now).to_string();
    let (date, time) = rfc3339.split_once('T').unwrap_or((rfc3339.as_str(), ""));
    format!(
        "{} {}",
        date.replace('-', ":"),
        time.trim_end_matches('Z')
    )
}

fn on_off<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "on" } else { "off" })
}
