//! Control channel: the art-app WebSocket and its two message layers.

pub mod command;
pub mod connection;
pub mod event;

pub use command::{ArtCommand, ConnInfo, encode_command};
pub use connection::{ChannelState, ControlChannel, InboundFrame, InboundKind, channel_url};
pub use event::{ArtEvent, ChannelEvent};
