//! The art-app WebSocket.
//!
//! [`ControlChannel`] owns the write half. The read half runs in its own
//! task and forwards every text frame, then a final close notice, tagged
//! with the generation of the socket it came from. Frames from a socket
//! that has since been replaced carry a stale generation and are dropped.

use crate::CHANNEL_PATH;
use crate::channel::command::{ArtCommand, encode_command};
use crate::error::channel::ChannelError;

use common::ErrorLocation;

use std::fmt;
use std::panic::Location;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

pub type ChannelStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Idle,
    Opening,
    Open,
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Idle => "idle",
            ChannelState::Opening => "opening",
            ChannelState::Open => "open",
            ChannelState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Something the read task observed on the socket.
#[derive(Debug)]
pub struct InboundFrame {
    pub generation: u64,
    pub kind: InboundKind,
}

#[derive(Debug)]
pub enum InboundKind {
    Text(String),
    Closed { reason: String },
}

/// `ws://{host}:{port}/api/v2/channels/com.samsung.art-app?name={client_name}`
pub fn channel_url(host: &str, port: u16, client_name: &str) -> Result<Url, ChannelError> {
    let mut url = Url::parse(&format!("ws://{host}:{port}{CHANNEL_PATH}"))?;
    url.query_pairs_mut().append_pair("name", client_name);
    Ok(url)
}

/// Perform the WebSocket handshake, bounded by `connect_timeout`.
pub async fn open(url: &Url, connect_timeout: Duration) -> Result<ChannelStream, ChannelError> {
    match timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(ChannelError::Handshake {
            message: format!("{url}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(_) => Err(ChannelError::Timeout {
            message: format!("{url}: no handshake after {connect_timeout:?}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

pub struct ControlChannel {
    state: ChannelState,
    generation: u64,
    sink: Option<SplitSink<ChannelStream, Message>>,
    reader: Option<JoinHandle<()>>,
}

impl ControlChannel {
    pub fn new() -> Self {
        Self {
            state: ChannelState::Idle,
            generation: 0,
            sink: None,
            reader: None,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Start a new open attempt and return its generation.
    pub fn begin_opening(&mut self) -> u64 {
        self.teardown();
        self.generation += 1;
        self.state = ChannelState::Opening;
        self.generation
    }

    /// Take ownership of a freshly opened socket.
    ///
    /// Returns `false` (and drops the socket) if the attempt was superseded.
    pub fn attach(
        &mut self,
        generation: u64,
        stream: ChannelStream,
        inbound_tx: mpsc::UnboundedSender<InboundFrame>,
    ) -> bool {
        if generation != self.generation || self.state != ChannelState::Opening {
            debug!("Dropping superseded channel socket (generation {generation})");
            return false;
        }

        let (sink, stream) = stream.split();
        self.sink = Some(sink);
        self.reader = Some(tokio::spawn(read_frames(stream, generation, inbound_tx)));
        self.state = ChannelState::Open;
        info!("Control channel open");
        true
    }

    /// Record a failed open attempt. Returns `false` for a superseded attempt.
    pub fn open_failed(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != ChannelState::Opening {
            return false;
        }
        self.state = ChannelState::Closed;
        true
    }

    /// The read task saw the socket go away. Returns whether this was the
    /// current socket.
    pub fn remote_closed(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != ChannelState::Open {
            return false;
        }
        self.teardown();
        self.state = ChannelState::Closed;
        true
    }

    /// Whether a frame tagged `generation` belongs to the live socket.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.state == ChannelState::Open
    }

    /// Encode and send one request. Returns `Ok(false)` without sending
    /// when the channel is not open.
    pub async fn send(
        &mut self,
        command: &ArtCommand,
        session_id: &str,
    ) -> Result<bool, ChannelError> {
        if self.state != ChannelState::Open {
            debug!(
                "Not sending {}: channel is {}",
                command.request_name(),
                self.state
            );
            return Ok(false);
        }
        let Some(sink) = self.sink.as_mut() else {
            return Ok(false);
        };

        let text = encode_command(command, session_id)?;
        debug!("-> {}", command.request_name());
        sink.send(Message::Text(text.into())).await?;
        Ok(true)
    }

    /// Close the socket if there is one. Returns whether it was open.
    pub async fn close(&mut self) -> bool {
        let was_open = self.state == ChannelState::Open;

        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close().await {
                debug!("Close handshake failed: {e}");
            }
        }
        self.teardown();

        // Invalidate anything still in flight for the old socket.
        self.generation += 1;
        if self.state != ChannelState::Idle {
            self.state = ChannelState::Closed;
        }
        was_open
    }

    fn teardown(&mut self) {
        self.sink = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Default for ControlChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn read_frames(
    mut stream: SplitStream<ChannelStream>,
    generation: u64,
    inbound_tx: mpsc::UnboundedSender<InboundFrame>,
) {
    let reason = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let frame = InboundFrame {
                    generation,
                    kind: InboundKind::Text(text.as_str().to_owned()),
                };
                if inbound_tx.send(frame).is_err() {
                    return;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                break frame
                    .map(|f| format!("{} {}", f.code, f.reason.as_str()))
                    .unwrap_or_else(|| "closed by device".to_string());
            }
            // Pings are answered by tungstenite; binary frames are not part of the protocol.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("Control channel read failed: {e}");
                break e.to_string();
            }
            None => break "stream ended".to_string(),
        }
    };

    let _ = inbound_tx.send(InboundFrame {
        generation,
        kind: InboundKind::Closed { reason },
    });
}
