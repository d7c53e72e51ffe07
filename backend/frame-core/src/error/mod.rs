pub mod channel;
pub mod config;
pub mod discovery;
pub mod session;
pub mod transfer;
pub mod wake;

pub use channel::ChannelError;
pub use config::ConfigError;
pub use discovery::DiscoveryError;
pub use session::SessionError;
pub use transfer::TransferError;
pub use wake::WakeError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Wake(#[from] WakeError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
