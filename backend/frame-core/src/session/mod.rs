//! The engine's public face.
//!
//! [`FrameSession`] is a cheap, cloneable handle. Every method enqueues work
//! for the session actor and returns immediately; results arrive later as
//! [`FrameNotification`]s and in the published [`SessionSnapshot`].
//!
//! # Example
//!
//! ```no_run
//! use frame_core::FrameSession;
//! use frame_core::config::EngineConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = FrameSession::new(EngineConfig::default())?;
//!     let mut notifications = session.subscribe();
//!
//!     session.set_target_address("192.168.1.20")?;
//!     session.connect()?;
//!
//!     while let Ok(notification) = notifications.recv().await {
//!         println!("{notification:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod actor;
pub mod notification;
pub mod state;

pub use notification::FrameNotification;
pub use state::{PendingUpload, SessionPhase, SessionSnapshot, Target};

use crate::channel::ArtCommand;
use crate::config::EngineConfig;
use crate::discovery::DiscoveryClient;
use crate::error::CoreError;
use crate::error::session::SessionError;

use actor::{SessionCommand, spawn_actor};

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

const NOTIFICATION_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct FrameSession {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    notifications: broadcast::Sender<FrameNotification>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    session_id: Arc<str>,
}

impl FrameSession {
    /// Validate `config` and start the session actor.
    ///
    /// Must be called from within a tokio runtime. The actor stops when the
    /// last handle is dropped.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Config`] - `config` fails validation
    /// - [`CoreError::Discovery`] - the HTTP client could not be built
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let discovery = DiscoveryClient::new(config.network.rest_port, config.timeouts.request())?;

        let session_id: Arc<str> = Arc::from(Uuid::new_v4().to_string());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let target = Target::from(&config.target);
        let snapshot = Arc::new(RwLock::new(
            state::SessionState::new(target).snapshot(Default::default()),
        ));

        spawn_actor(
            config,
            Arc::clone(&session_id),
            discovery,
            command_rx,
            notifications.clone(),
            Arc::clone(&snapshot),
        );

        Ok(Self {
            command_tx,
            notifications,
            snapshot,
            session_id,
        })
    }

    /// Random id stamped into every request. Fixed for the life of the session.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Receive every notification published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameNotification> {
        self.notifications.subscribe()
    }

    /// Latest published state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().await.clone()
    }

    fn enqueue(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .map_err(|e| SessionError::closed(format!("session actor is gone: {e}")))
    }

    fn request(&self, command: ArtCommand) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::Send(command))
    }

    // ============================================
    // TARGET AND LIFECYCLE
    // ============================================

    /// Set the device host. Starts a connection if [`connect`](Self::connect)
    /// was called while no address was known.
    pub fn set_target_address(&self, host: impl Into<String>) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::SetTargetAddress(host.into()))
    }

    /// MAC address used for wake packets. Any separator style is accepted.
    pub fn set_hardware_address(&self, mac: impl Into<String>) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::SetHardwareAddress(mac.into()))
    }

    /// Name shown on the TV's device-access prompt. Applies to the next connection.
    pub fn set_client_name(&self, name: impl Into<String>) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::SetClientName(name.into()))
    }

    /// Wake the device, discover it and open the control channel.
    ///
    /// Does nothing while a connection exists or is in progress.
    pub fn connect(&self) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::Connect)
    }

    pub fn disconnect(&self) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::Disconnect)
    }

    /// Send a wake packet without connecting.
    pub fn wake(&self) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::Wake)
    }

    // ============================================
    // ART-APP REQUESTS
    // ============================================

    pub fn get_art_mode_status(&self) -> Result<(), SessionError> {
        self.request(ArtCommand::GetArtModeStatus)
    }

    pub fn set_art_mode_status(&self, on: bool) -> Result<(), SessionError> {
        self.request(ArtCommand::SetArtModeStatus { value: on })
    }

    pub fn get_device_info(&self) -> Result<(), SessionError> {
        self.request(ArtCommand::GetDeviceInfo)
    }

    pub fn get_api_version(&self) -> Result<(), SessionError> {
        self.request(ArtCommand::GetApiVersion)
    }

    pub fn get_content_list(&self) -> Result<(), SessionError> {
        self.request(ArtCommand::content_list())
    }

    pub fn get_matte_list(&self) -> Result<(), SessionError> {
        self.request(ArtCommand::GetMatteList)
    }

    pub fn get_photo_filter_list(&self) -> Result<(), SessionError> {
        self.request(ArtCommand::GetPhotoFilterList)
    }

    pub fn get_current_artwork(&self) -> Result<(), SessionError> {
        self.request(ArtCommand::GetCurrentArtwork)
    }

    /// Show `content_id`. `category_id` may be omitted for uploaded images.
    pub fn select_image(
        &self,
        content_id: impl Into<String>,
        category_id: Option<String>,
    ) -> Result<(), SessionError> {
        self.request(ArtCommand::select_image(content_id, category_id))
    }

    pub fn change_matte(
        &self,
        content_id: impl Into<String>,
        matte_id: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.request(ArtCommand::ChangeMatte {
            content_id: content_id.into(),
            matte_id: matte_id.into(),
        })
    }

    pub fn delete_image(&self, content_id: impl Into<String>) -> Result<(), SessionError> {
        self.request(ArtCommand::delete_image(content_id))
    }

    /// Ask for a thumbnail. It is saved to disk and announced with
    /// [`FrameNotification::ThumbnailReady`].
    pub fn request_thumbnail(&self, content_id: impl Into<String>) -> Result<(), SessionError> {
        self.request(ArtCommand::thumbnail(content_id, &self.session_id))
    }

    // ============================================
    // UPLOAD
    // ============================================

    /// Announce an upload and hold `payload` until the device is ready for it.
    ///
    /// Only one upload is held at a time; a newer request replaces an older
    /// one the device has not accepted yet.
    pub fn request_upload(
        &self,
        payload: Vec<u8>,
        matte_id: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.enqueue(SessionCommand::RequestUpload(PendingUpload {
            payload,
            matte_id: matte_id.into(),
        }))
    }

    /// Read `path` and [`request_upload`](Self::request_upload) its contents.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Io`] - the file could not be read
    /// - [`SessionError::Closed`] - the session actor is gone
    pub async fn upload_image_file(
        &self,
        path: impl AsRef<Path>,
        matte_id: impl Into<String>,
    ) -> Result<(), SessionError> {
        let payload = tokio::fs::read(path.as_ref()).await?;
        self.request_upload(payload, matte_id)
    }
}
