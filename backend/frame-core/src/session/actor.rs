//! The session actor.
//!
//! One task owns [`SessionState`] and the [`ControlChannel`]. It handles, one
//! at a time, caller commands, completions of the work it spawned (discovery,
//! channel open) and frames from the channel reader. Nothing else mutates
//! session state; readers see the snapshot it republishes after every step.

use crate::channel::connection::{self, ChannelStream};
use crate::channel::{
    ArtCommand, ArtEvent, ChannelEvent, ControlChannel, InboundFrame, InboundKind, channel_url,
};
use crate::config::EngineConfig;
use crate::discovery::{DeviceInfo, DiscoveryClient};
use crate::error::channel::ChannelError;
use crate::error::discovery::DiscoveryError;
use crate::session::notification::FrameNotification;
use crate::session::state::{PendingUpload, SessionPhase, SessionSnapshot, SessionState, Target};
use crate::transfer::{
    TransferDirection, TransferEndpoint, UploadTicket, fetch_thumbnail, push_image,
};
use crate::wake::send_wake;

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, trace, warn};
use serde_json::Value;
use tokio::sync::{RwLock, broadcast, mpsc};

/// Requests from [`FrameSession`](crate::FrameSession) handles.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    SetTargetAddress(String),
    SetHardwareAddress(String),
    SetClientName(String),
    Connect,
    Disconnect,
    Wake,
    Send(ArtCommand),
    RequestUpload(PendingUpload),
}

/// Completions of work the actor spawned.
enum InternalEvent {
    Discovered {
        attempt: u64,
        result: Result<DeviceInfo, DiscoveryError>,
    },
    ChannelOpened {
        generation: u64,
        result: Result<ChannelStream, ChannelError>,
    },
}

pub(crate) struct SessionActor {
    config: EngineConfig,
    session_id: Arc<str>,
    state: SessionState,
    channel: ControlChannel,
    discovery: DiscoveryClient,
    thumbnail_dir: PathBuf,
    notifications: broadcast::Sender<FrameNotification>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    inbound_tx: mpsc::UnboundedSender<InboundFrame>,
}

/// Start the actor task. It runs until every command sender is dropped.
pub(crate) fn spawn_actor(
    config: EngineConfig,
    session_id: Arc<str>,
    discovery: DiscoveryClient,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    notifications: broadcast::Sender<FrameNotification>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
) {
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    let target = Target::from(&config.target);
    let thumbnail_dir = config.transfer.resolved_thumbnail_dir();

    let actor = SessionActor {
        config,
        session_id,
        state: SessionState::new(target),
        channel: ControlChannel::new(),
        discovery,
        thumbnail_dir,
        notifications,
        snapshot,
        internal_tx,
        inbound_tx,
    };

    tokio::spawn(actor.run(command_rx, internal_rx, inbound_rx));
}

impl SessionActor {
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
        mut internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
        mut inbound_rx: mpsc::UnboundedReceiver<InboundFrame>,
    ) {
        info!("Frame session {} started", self.session_id);
        self.refresh_snapshot().await;

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = internal_rx.recv() => self.handle_internal(event).await,
                Some(frame) = inbound_rx.recv() => self.handle_inbound(frame).await,
            }
            self.refresh_snapshot().await;
        }

        self.channel.close().await;
        info!("Frame session {} stopped", self.session_id);
    }

    async fn refresh_snapshot(&self) {
        let snapshot = self.state.snapshot(self.channel.state());
        *self.snapshot.write().await = snapshot;
    }

    fn publish(&self, notification: FrameNotification) {
        // Err only means nobody is subscribed right now.
        if self.notifications.send(notification).is_err() {
            trace!("Notification dropped: no subscribers");
        }
    }

    // ============================================
    // CALLER COMMANDS
    // ============================================

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SetTargetAddress(host) => {
                info!("Target address set to '{host}'");
                self.state.target.host = host;
                if self.state.wants_connect && !self.state.target.host.is_empty() {
                    self.connect();
                }
            }
            SessionCommand::SetHardwareAddress(mac) => {
                self.state.target.mac_address = mac;
            }
            SessionCommand::SetClientName(name) => {
                self.state.target.client_name = name;
            }
            SessionCommand::Connect => self.connect(),
            SessionCommand::Disconnect => self.disconnect().await,
            SessionCommand::Wake => self.spawn_wake(),
            SessionCommand::Send(command) => self.send(command).await,
            SessionCommand::RequestUpload(upload) => self.request_upload(upload).await,
        }
    }

    fn connect(&mut self) {
        if self.state.phase != SessionPhase::Disconnected {
            debug!("Connect ignored: session is {}", self.state.phase);
            return;
        }
        if self.state.target.host.is_empty() {
            info!("No target address yet, will connect once one is set");
            self.state.wants_connect = true;
            return;
        }

        self.state.wants_connect = false;
        self.state.phase = SessionPhase::Connecting;
        self.state.attempt += 1;
        let attempt = self.state.attempt;

        self.spawn_wake();

        let host = self.state.target.host.clone();
        let discovery = self.discovery.clone();
        let internal_tx = self.internal_tx.clone();
        info!("Connecting to {host}");
        tokio::spawn(async move {
            let result = discovery.discover(&host).await;
            let _ = internal_tx.send(InternalEvent::Discovered { attempt, result });
        });
    }

    async fn disconnect(&mut self) {
        self.state.wants_connect = false;
        // Stale discovery results are ignored from here on.
        self.state.attempt += 1;

        let was_open = self.channel.close().await;
        if self.state.phase != SessionPhase::Disconnected {
            info!("Disconnected from {}", self.state.target.host);
        }
        self.state.phase = SessionPhase::Disconnected;
        self.state.reset_device_state();

        if was_open {
            self.publish(FrameNotification::ConnectionChanged(false));
        }
    }

    async fn send(&mut self, command: ArtCommand) {
        if let Err(e) = self.channel.send(&command, &self.session_id).await {
            warn!("Failed to send {}: {e}", command.request_name());
        }
    }

    async fn request_upload(&mut self, upload: PendingUpload) {
        let command = ArtCommand::send_image(
            upload.payload.len(),
            upload.matte_id.clone(),
            &self.session_id,
        );
        if let Some(previous) = self.state.pending_upload.replace(upload) {
            warn!(
                "Replacing pending upload of {} bytes that the device never accepted",
                previous.payload.len()
            );
        }
        self.send(command).await;
    }

    fn spawn_wake(&self) {
        let mac = self.state.target.mac_address.clone();
        let target = self.config.network.wake_target();
        tokio::spawn(async move {
            match send_wake(&mac, target).await {
                Ok(true) => debug!("Wake packet sent to {target}"),
                Ok(false) => debug!("No usable hardware address, wake skipped"),
                Err(e) => warn!("Wake packet failed: {e}"),
            }
        });
    }

    // ============================================
    // SPAWNED WORK COMPLETIONS
    // ============================================

    async fn handle_internal(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::Discovered { attempt, result } => {
                if attempt != self.state.attempt || self.state.phase != SessionPhase::Connecting {
                    debug!("Discarding discovery result of abandoned attempt {attempt}");
                    return;
                }
                match result {
                    Ok(device_info) => {
                        info!(
                            "Discovered '{}' at {}",
                            device_info.name().unwrap_or("unnamed device"),
                            self.state.target.host
                        );
                        self.state.device_info = device_info;
                        self.publish(FrameNotification::DeviceInfoUpdated(
                            self.state.device_info.clone(),
                        ));
                        self.state.phase = SessionPhase::AwaitingChannel;
                        self.open_channel();
                    }
                    Err(e) => {
                        warn!("Discovery of {} failed: {e}", self.state.target.host);
                        self.state.phase = SessionPhase::Disconnected;
                        self.publish(FrameNotification::DiscoveryFailed {
                            message: e.to_string(),
                        });
                    }
                }
            }
            InternalEvent::ChannelOpened { generation, result } => match result {
                Ok(stream) => {
                    self.channel
                        .attach(generation, stream, self.inbound_tx.clone());
                }
                Err(e) => {
                    if !self.channel.open_failed(generation) {
                        return;
                    }
                    warn!("Control channel failed to open: {e}");
                    self.state.phase = SessionPhase::Disconnected;
                    self.publish(FrameNotification::ChannelError {
                        message: e.to_string(),
                    });
                    self.publish(FrameNotification::ConnectionChanged(false));
                }
            },
        }
    }

    fn open_channel(&mut self) {
        let url = match channel_url(
            &self.state.target.host,
            self.config.network.channel_port,
            &self.state.target.client_name,
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build control channel URL: {e}");
                self.state.phase = SessionPhase::Disconnected;
                self.publish(FrameNotification::ChannelError {
                    message: e.to_string(),
                });
                return;
            }
        };

        let generation = self.channel.begin_opening();
        let connect_timeout = self.config.timeouts.connect();
        let internal_tx = self.internal_tx.clone();
        debug!("Opening control channel {url}");
        tokio::spawn(async move {
            let result = connection::open(&url, connect_timeout).await;
            let _ = internal_tx.send(InternalEvent::ChannelOpened { generation, result });
        });
    }

    // ============================================
    // CHANNEL FRAMES
    // ============================================

    async fn handle_inbound(&mut self, frame: InboundFrame) {
        if !self.channel.is_current(frame.generation) {
            trace!("Dropping frame from replaced socket {}", frame.generation);
            return;
        }

        match frame.kind {
            InboundKind::Text(text) => match ChannelEvent::parse(&text) {
                Ok(event) => self.dispatch(event).await,
                Err(e) => warn!("Dropping malformed channel frame: {e}"),
            },
            InboundKind::Closed { reason } => {
                if !self.channel.remote_closed(frame.generation) {
                    return;
                }
                info!("Control channel closed: {reason}");
                self.state.phase = SessionPhase::Disconnected;
                self.state.reset_device_state();
                self.publish(FrameNotification::ConnectionChanged(false));
            }
        }
    }

    async fn dispatch(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connect => debug!("Channel connected, waiting for ready"),
            ChannelEvent::Ready => {
                info!("Art channel ready");
                self.state.phase = SessionPhase::Ready;
                for command in [
                    ArtCommand::GetApiVersion,
                    ArtCommand::GetDeviceInfo,
                    ArtCommand::GetArtModeStatus,
                ] {
                    self.send(command).await;
                }
                self.publish(FrameNotification::ConnectionChanged(true));
            }
            ChannelEvent::ServiceMessage(event) => self.handle_art_event(event).await,
            ChannelEvent::Unauthorized => {
                warn!("Device refused this client, allow it on the TV and reconnect");
                self.publish(FrameNotification::Unauthorized);
            }
            ChannelEvent::Error { message } => {
                warn!("Channel error from device: {message}");
                self.publish(FrameNotification::ChannelError { message });
            }
            ChannelEvent::Other { event, data } => {
                debug!("Unhandled channel event '{event}'");
                self.publish(FrameNotification::Raw { event, data });
            }
        }
    }

    async fn handle_art_event(&mut self, event: ArtEvent) {
        trace!("<- {}", event.tag());
        match event {
            ArtEvent::ArtModeStatus { on } | ArtEvent::ArtModeChanged { on } => {
                self.state.art_mode = on;
                self.publish(FrameNotification::ArtModeChanged(on));
            }
            ArtEvent::FavoriteChanged { content_id, on } => {
                self.publish(FrameNotification::FavoriteChanged {
                    content_id,
                    status: on,
                });
            }
            ArtEvent::DeviceInfo(fields) => {
                self.state.device_info.merge(fields);
                self.publish(FrameNotification::DeviceInfoUpdated(
                    self.state.device_info.clone(),
                ));
            }
            ArtEvent::RotationImageChanged { content_id, kind } => {
                self.publish(FrameNotification::RotationImageChanged { content_id, kind });
            }
            ArtEvent::ApiVersion { version } => {
                self.publish(FrameNotification::ApiVersion(version));
            }
            ArtEvent::CurrentArtwork {
                content_id,
                matte_id,
                portrait_matte_id,
            } => {
                self.publish(FrameNotification::CurrentArtwork {
                    content_id,
                    matte_id,
                    portrait_matte_id,
                });
            }
            ArtEvent::ContentList(items) => {
                self.publish(FrameNotification::ContentList(items));
            }
            ArtEvent::MatteList { types, colors } => {
                self.publish(FrameNotification::MatteList { types, colors });
            }
            ArtEvent::FilterList(filters) => {
                self.publish(FrameNotification::FilterList(filters));
            }
            ArtEvent::ImageSelected {
                content_id,
                matte_id,
                is_shown,
            } => {
                self.publish(FrameNotification::ImageSelected {
                    content_id,
                    matte_id,
                    is_shown,
                });
            }
            ArtEvent::Thumbnail(endpoint) => self.spawn_download(endpoint),
            ArtEvent::ReadyToUse(ticket) => match self.state.pending_upload.take() {
                Some(upload) => self.spawn_upload(ticket, upload),
                None => warn!("Device is ready for an upload but none is pending"),
            },
            ArtEvent::ImageAdded {
                content_id,
                category_id,
            } => {
                if category_id.is_empty() {
                    info!("Upload stored as {content_id}, selecting it");
                    self.send(ArtCommand::select_image(content_id.clone(), None))
                        .await;
                    self.publish(FrameNotification::UploadFinished { content_id });
                } else {
                    debug!("Image {content_id} added to {category_id}");
                }
            }
            ArtEvent::ImagesDeleted(content_ids) => {
                self.publish(FrameNotification::ImagesDeleted(content_ids));
            }
            ArtEvent::Error {
                error_code,
                request,
            } => {
                warn!("Device rejected a request with error {error_code}");
                self.publish(FrameNotification::DeviceError {
                    error_code,
                    request,
                });
            }
            ArtEvent::GoToStandby => {
                info!("Device is going to standby, sending wake");
                self.spawn_wake();
            }
            ArtEvent::Other { event, data } => {
                debug!("Unhandled art event '{event}'");
                self.publish(FrameNotification::Raw {
                    event,
                    data: Value::Object(data),
                });
            }
        }
    }

    // ============================================
    // TRANSFERS
    // ============================================

    fn spawn_download(&self, endpoint: TransferEndpoint) {
        let notifications = self.notifications.clone();
        let dir = self.thumbnail_dir.clone();
        let connect_timeout = self.config.timeouts.connect();
        let read_timeout = self.config.timeouts.transfer_read();

        tokio::spawn(async move {
            let notification =
                match fetch_thumbnail(&endpoint, &dir, connect_timeout, read_timeout).await {
                    Ok(thumbnail) => FrameNotification::ThumbnailReady {
                        content_id: thumbnail.content_id,
                        path: thumbnail.path,
                    },
                    Err(e) => {
                        warn!("Thumbnail download from {endpoint} failed: {e}");
                        FrameNotification::TransferFailed {
                            direction: TransferDirection::Download,
                            message: e.to_string(),
                        }
                    }
                };
            let _ = notifications.send(notification);
        });
    }

    fn spawn_upload(&self, ticket: UploadTicket, upload: PendingUpload) {
        let notifications = self.notifications.clone();
        let connect_timeout = self.config.timeouts.connect();

        tokio::spawn(async move {
            match push_image(&ticket, &upload.payload, connect_timeout).await {
                Ok(written) => debug!(
                    "Pushed {written} bytes to {} (matte '{}')",
                    ticket.endpoint, upload.matte_id
                ),
                Err(e) => {
                    warn!("Upload to {} failed: {e}", ticket.endpoint);
                    let _ = notifications.send(FrameNotification::TransferFailed {
                        direction: TransferDirection::Upload,
                        message: e.to_string(),
                    });
                }
            }
        });
    }
}
