//! Session state owned by the actor, and the snapshot published for reads.

use crate::channel::ChannelState;
use crate::config::TargetConfig;
use crate::discovery::DeviceInfo;

use std::fmt;

/// Where the device lives and how this client introduces itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub mac_address: String,
    pub client_name: String,
}

impl From<&TargetConfig> for Target {
    fn from(config: &TargetConfig) -> Self {
        Self {
            host: config.host.clone(),
            mac_address: config.mac_address.clone(),
            client_name: config.client_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Disconnected,
    /// Wake sent, REST discovery in flight.
    Connecting,
    /// Discovery done, waiting for the WebSocket and `ms.channel.ready`.
    AwaitingChannel,
    Ready,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Disconnected => "disconnected",
            SessionPhase::Connecting => "connecting",
            SessionPhase::AwaitingChannel => "awaiting channel",
            SessionPhase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Bytes waiting for the device's `ready_to_use`.
#[derive(Clone)]
pub struct PendingUpload {
    pub payload: Vec<u8>,
    pub matte_id: String,
}

impl fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingUpload")
            .field("payload", &format_args!("{} bytes", self.payload.len()))
            .field("matte_id", &self.matte_id)
            .finish()
    }
}

/// Point-in-time copy of the session, as seen by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub channel: ChannelState,
    pub target: Target,
    pub device_info: DeviceInfo,
    pub art_mode: bool,
    pub wants_connect: bool,
    pub upload_pending: bool,
}

impl SessionSnapshot {
    /// The control channel is open. Requests are only sent while this holds.
    pub fn is_connected(&self) -> bool {
        self.channel == ChannelState::Open
    }

    /// A connection attempt is underway and has not reached `Ready` yet.
    pub fn is_connecting(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Connecting | SessionPhase::AwaitingChannel
        )
    }

    pub fn frame_name(&self) -> Option<&str> {
        self.device_info.name()
    }

    pub fn has_frame_tv_support(&self) -> bool {
        self.device_info.has_frame_tv_support()
    }
}

pub(crate) struct SessionState {
    pub phase: SessionPhase,
    pub target: Target,
    pub wants_connect: bool,
    pub device_info: DeviceInfo,
    pub art_mode: bool,
    pub pending_upload: Option<PendingUpload>,
    /// Bumped on every connect and disconnect; discovery results carry the
    /// value they were started with.
    pub attempt: u64,
}

impl SessionState {
    pub fn new(target: Target) -> Self {
        Self {
            phase: SessionPhase::Disconnected,
            target,
            wants_connect: false,
            device_info: DeviceInfo::default(),
            art_mode: true,
            pending_upload: None,
            attempt: 0,
        }
    }

    /// Forget everything learned from the device.
    pub fn reset_device_state(&mut self) {
        self.device_info = DeviceInfo::default();
        self.art_mode = true;
        self.pending_upload = None;
    }

    pub fn snapshot(&self, channel: ChannelState) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            channel,
            target: self.target.clone(),
            device_info: self.device_info.clone(),
            art_mode: self.art_mode,
            wants_connect: self.wants_connect,
            upload_pending: self.pending_upload.is_some(),
        }
    }
}
