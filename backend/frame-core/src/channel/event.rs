//! Inbound channel frames.
//!
//! Two layers: the transport envelope (`ms.channel.*` events), and for
//! `d2d_service_message` a nested art-app document whose `event` field
//! selects one of the [`ArtEvent`] variants. Nested documents and several
//! of their fields arrive either as JSON text or as structured JSON; both
//! are accepted.

use crate::error::channel::ChannelError;
use crate::json_fields::{
    lenient_port, lenient_string, nested, nested_document, nested_or_default,
};
use crate::transfer::{TransferEndpoint, UploadTicket};

use common::RedactedKey;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const MS_CHANNEL_CONNECT: &str = "ms.channel.connect";
pub const MS_CHANNEL_READY: &str = "ms.channel.ready";
pub const MS_CHANNEL_UNAUTHORIZED: &str = "ms.channel.unauthorized";
pub const MS_ERROR: &str = "ms.error";
pub const D2D_SERVICE_MESSAGE: &str = "d2d_service_message";

/// Keys the device adds to `get_device_info` replies that are not device fields.
const DEVICE_INFO_ENVELOPE_KEYS: [&str; 3] = ["event", "id", "target_client_id"];

/// A decoded transport frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connect,
    Ready,
    ServiceMessage(ArtEvent),
    Unauthorized,
    Error { message: String },
    /// Any transport event this client does not act on.
    Other { event: String, data: Value },
}

/// A decoded art-app event.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtEvent {
    /// Reply to `get_artmode_status`.
    ArtModeStatus { on: bool },
    /// Pushed when art mode is toggled on the device.
    ArtModeChanged { on: bool },
    FavoriteChanged { content_id: String, on: bool },
    DeviceInfo(Map<String, Value>),
    RotationImageChanged { content_id: String, kind: String },
    ApiVersion { version: String },
    CurrentArtwork {
        content_id: String,
        matte_id: String,
        portrait_matte_id: String,
    },
    ContentList(Vec<Value>),
    MatteList { types: Vec<Value>, colors: Vec<Value> },
    FilterList(Vec<Value>),
    ImageSelected {
        content_id: String,
        matte_id: String,
        is_shown: String,
    },
    Thumbnail(TransferEndpoint),
    ReadyToUse(UploadTicket),
    ImageAdded { content_id: String, category_id: String },
    ImagesDeleted(Vec<String>),
    Error { error_code: String, request: Value },
    GoToStandby,
    /// Unknown tag. Carried through untouched.
    Other { event: String, data: Map<String, Value> },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    event: String,
    #[serde(default)]
    data: Value,
}

impl ChannelEvent {
    /// Decode one text frame. Malformed frames are an error; unknown events are not.
    pub fn parse(text: &str) -> Result<Self, ChannelError> {
        let envelope: Envelope = serde_json::from_str(text)?;

        let event = match envelope.event.as_str() {
            MS_CHANNEL_CONNECT => ChannelEvent::Connect,
            MS_CHANNEL_READY => ChannelEvent::Ready,
            MS_CHANNEL_UNAUTHORIZED => ChannelEvent::Unauthorized,
            MS_ERROR => ChannelEvent::Error {
                message: error_message(&envelope.data),
            },
            D2D_SERVICE_MESSAGE => ChannelEvent::ServiceMessage(ArtEvent::parse(envelope.data)?),
            _ => ChannelEvent::Other {
                event: envelope.event,
                data: envelope.data,
            },
        };
        Ok(event)
    }
}

fn error_message(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(s)) => s.clone(),
            _ => data.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================
// NESTED ART-APP PAYLOADS
// ============================================

#[derive(Deserialize)]
struct ValueField {
    #[serde(default, deserialize_with = "lenient_string")]
    value: String,
}

#[derive(Deserialize)]
struct StatusField {
    #[serde(default, deserialize_with = "lenient_string")]
    status: String,
}

#[derive(Deserialize)]
struct Favorite {
    #[serde(default, deserialize_with = "lenient_string")]
    content_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    status: String,
}

#[derive(Deserialize)]
struct RotationImage {
    #[serde(default, deserialize_with = "lenient_string")]
    current_content_id: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    kind: String,
}

#[derive(Deserialize)]
struct ApiVersionReply {
    #[serde(default, deserialize_with = "lenient_string")]
    version: String,
}

#[derive(Deserialize)]
struct CurrentArtworkReply {
    #[serde(default, deserialize_with = "lenient_string")]
    content_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    matte_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    portrait_matte_id: String,
}

#[derive(Deserialize)]
struct ContentListReply {
    #[serde(default, deserialize_with = "nested_or_default")]
    content_list: Vec<Value>,
}

#[derive(Deserialize)]
struct MatteListReply {
    #[serde(default, deserialize_with = "nested_or_default")]
    matte_type_list: Vec<Value>,
    #[serde(default, deserialize_with = "nested_or_default")]
    matte_color_list: Vec<Value>,
}

#[derive(Deserialize)]
struct FilterListReply {
    #[serde(default, deserialize_with = "nested_or_default")]
    filter_list: Vec<Value>,
}

#[derive(Deserialize)]
struct ImageSelectedReply {
    #[serde(default, deserialize_with = "lenient_string")]
    content_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    matte_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    is_shown: String,
}

#[derive(Deserialize)]
struct ConnInfoReply {
    #[serde(default, deserialize_with = "lenient_string")]
    ip: String,
    #[serde(deserialize_with = "lenient_port")]
    port: u16,
    #[serde(default, deserialize_with = "lenient_string")]
    key: String,
}

#[derive(Deserialize)]
struct ConnInfoEnvelope {
    #[serde(deserialize_with = "nested")]
    conn_info: ConnInfoReply,
}

#[derive(Deserialize)]
struct ImageAddedReply {
    #[serde(default, deserialize_with = "lenient_string")]
    content_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    category_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeletedItem {
    Entry {
        #[serde(deserialize_with = "lenient_string")]
        content_id: String,
    },
    Id(String),
}

#[derive(Deserialize)]
struct ImagesDeletedReply {
    #[serde(default, deserialize_with = "nested_or_default")]
    content_id_list: Vec<DeletedItem>,
}

#[derive(Deserialize)]
struct ErrorReply {
    #[serde(default, deserialize_with = "lenient_string")]
    error_code: String,
    #[serde(default, deserialize_with = "nested_or_default")]
    request_data: Value,
}

impl ArtEvent {
    /// Decode the `data` of a `d2d_service_message`.
    pub fn parse(data: Value) -> Result<Self, ChannelError> {
        let Value::Object(mut fields) = nested_document(data)? else {
            return Err(ChannelError::envelope(
                "service message data is not a JSON object",
            ));
        };

        let tag = match fields.get("event") {
            Some(Value::String(tag)) => tag.clone(),
            _ => String::new(),
        };

        let event = match tag.as_str() {
            "artmode_status" => {
                let reply: ValueField = decode(&fields)?;
                ArtEvent::ArtModeStatus {
                    on: is_on(&reply.value),
                }
            }
            "art_mode_changed" => {
                let reply: StatusField = decode(&fields)?;
                ArtEvent::ArtModeChanged {
                    on: is_on(&reply.status),
                }
            }
            "favorite_changed" => {
                let reply: Favorite = decode(&fields)?;
                ArtEvent::FavoriteChanged {
                    content_id: reply.content_id,
                    on: is_on(&reply.status),
                }
            }
            "get_device_info" => {
                for key in DEVICE_INFO_ENVELOPE_KEYS {
                    fields.remove(key);
                }
                ArtEvent::DeviceInfo(fields)
            }
            "auto_rotation_image_changed" => {
                let reply: RotationImage = decode(&fields)?;
                ArtEvent::RotationImageChanged {
                    content_id: reply.current_content_id,
                    kind: reply.kind,
                }
            }
            "api_version" => {
                let reply: ApiVersionReply = decode(&fields)?;
                ArtEvent::ApiVersion {
                    version: reply.version,
                }
            }
            "current_artwork" => {
                let reply: CurrentArtworkReply = decode(&fields)?;
                ArtEvent::CurrentArtwork {
                    content_id: reply.content_id,
                    matte_id: reply.matte_id,
                    portrait_matte_id: reply.portrait_matte_id,
                }
            }
            "content_list" => {
                let reply: ContentListReply = decode(&fields)?;
                ArtEvent::ContentList(reply.content_list)
            }
            "matte_list" => {
                let reply: MatteListReply = decode(&fields)?;
                ArtEvent::MatteList {
                    types: reply.matte_type_list,
                    colors: reply.matte_color_list,
                }
            }
            "get_photo_filter_list" => {
                let reply: FilterListReply = decode(&fields)?;
                ArtEvent::FilterList(reply.filter_list)
            }
            "image_selected" => {
                let reply: ImageSelectedReply = decode(&fields)?;
                ArtEvent::ImageSelected {
                    content_id: reply.content_id,
                    matte_id: reply.matte_id,
                    is_shown: reply.is_shown,
                }
            }
            "thumbnail" => {
                let conn = conn_info(&fields)?;
                ArtEvent::Thumbnail(TransferEndpoint {
                    ip: conn.ip,
                    port: conn.port,
                })
            }
            "ready_to_use" => {
                let conn = conn_info(&fields)?;
                ArtEvent::ReadyToUse(UploadTicket {
                    endpoint: TransferEndpoint {
                        ip: conn.ip,
                        port: conn.port,
                    },
                    key: RedactedKey::new(conn.key),
                })
            }
            "image_added" => {
                let reply: ImageAddedReply = decode(&fields)?;
                ArtEvent::ImageAdded {
                    content_id: reply.content_id,
                    category_id: reply.category_id,
                }
            }
            "image_list_deleted" => {
                let reply: ImagesDeletedReply = decode(&fields)?;
                ArtEvent::ImagesDeleted(
                    reply
                        .content_id_list
                        .into_iter()
                        .map(|item| match item {
                            DeletedItem::Entry { content_id } | DeletedItem::Id(content_id) => {
                                content_id
                            }
                        })
                        .collect(),
                )
            }
            "error" => {
                let reply: ErrorReply = decode(&fields)?;
                ArtEvent::Error {
                    error_code: reply.error_code,
                    request: reply.request_data,
                }
            }
            "go_to_standby" => ArtEvent::GoToStandby,
            _ => ArtEvent::Other {
                event: tag,
                data: fields,
            },
        };
        Ok(event)
    }

    /// The art-app tag this event was decoded from.
    pub fn tag(&self) -> &str {
        match self {
            ArtEvent::ArtModeStatus { .. } => "artmode_status",
            ArtEvent::ArtModeChanged { .. } => "art_mode_changed",
            ArtEvent::FavoriteChanged { .. } => "favorite_changed",
            ArtEvent::DeviceInfo(_) => "get_device_info",
            ArtEvent::RotationImageChanged { .. } => "auto_rotation_image_changed",
            ArtEvent::ApiVersion { .. } => "api_version",
            ArtEvent::CurrentArtwork { .. } => "current_artwork",
            ArtEvent::ContentList(_) => "content_list",
            ArtEvent::MatteList { .. } => "matte_list",
            ArtEvent::FilterList(_) => "get_photo_filter_list",
            ArtEvent::ImageSelected { .. } => "image_selected",
            ArtEvent::Thumbnail(_) => "thumbnail",
            ArtEvent::ReadyToUse(_) => "ready_to_use",
            ArtEvent::ImageAdded { .. } => "image_added",
            ArtEvent::ImagesDeleted(_) => "image_list_deleted",
            ArtEvent::Error { .. } => "error",
            ArtEvent::GoToStandby => "go_to_standby",
            ArtEvent::Other { event, .. } => event.as_str(),
        }
    }
}

fn decode<T: DeserializeOwned>(fields: &Map<String, Value>) -> Result<T, ChannelError> {
    Ok(serde_json::from_value(Value::Object(fields.clone()))?)
}

fn conn_info(fields: &Map<String, Value>) -> Result<ConnInfoReply, ChannelError> {
    let reply: ConnInfoEnvelope = decode(fields)?;
    Ok(reply.conn_info)
}

fn is_on(status: &str) -> bool {
    status.eq_ignore_ascii_case("on")
}
