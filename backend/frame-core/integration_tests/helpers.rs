//! Test helpers for engine integration tests.
//!
//! - A fake device control channel (WebSocket server speaking the art-app envelope)
//! - A wiremock REST discovery endpoint
//! - Raw TCP endpoints for transfer tests
//! - Notification and snapshot waiters with timeouts

use frame_core::config::EngineConfig;
use frame_core::transfer::TransferEndpoint;
use frame_core::{FrameNotification, FrameSession, SessionSnapshot};

use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WAIT: Duration = Duration::from_secs(5);
pub const DEVICE_HOST: &str = "127.0.0.1";

// ============================================
// CONFIG
// ============================================

/// Config pointing REST and the channel at local test servers.
pub fn test_config(rest_port: u16, channel_port: u16, thumbnail_dir: &Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.network.rest_port = rest_port;
    config.network.channel_port = channel_port;
    config.timeouts.request_secs = 2;
    config.timeouts.connect_secs = 2;
    config.timeouts.transfer_read_secs = 2;
    config.transfer.thumbnail_dir = Some(thumbnail_dir.to_path_buf());
    config
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

// ============================================
// REST DISCOVERY
// ============================================

pub fn discovery_body() -> Value {
    json!({
        "device": {
            "name": "Test Frame",
            "FrameTVSupport": "true",
            "model": "QE55LS03",
        },
        "version": "2.0.25",
        "isSupport": "{\"remote\":\"true\"}",
    })
}

/// Discovery endpoint expected to be hit exactly `times` times.
pub async fn mock_discovery(times: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_body()))
        .expect(times)
        .mount(&server)
        .await;
    server
}

// ============================================
// FAKE DEVICE CONTROL CHANNEL
// ============================================

enum DeviceAction {
    Send(String),
    Close,
}

/// Accepts one control-channel connection and records what the client sends.
pub struct FakeDevice {
    pub port: u16,
    actions: mpsc::UnboundedSender<DeviceAction>,
    requests: mpsc::UnboundedReceiver<Value>,
    uri: Option<oneshot::Receiver<String>>,
}

impl FakeDevice {
    pub async fn start() -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<DeviceAction>();
        let (request_tx, request_rx) = mpsc::unbounded_channel::<Value>();
        let (uri_tx, uri_rx) = oneshot::channel::<String>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                let _ = uri_tx.send(request.uri().to_string());
                Ok(response)
            };
            let mut ws = accept_hdr_async(stream, callback).await.unwrap();

            loop {
                tokio::select! {
                    action = action_rx.recv() => match action {
                        Some(DeviceAction::Send(text)) => {
                            if ws.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Some(DeviceAction::Close) | None => {
                            let _ = ws.close(None).await;
                            break;
                        }
                    },
                    frame = ws.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let _ = request_tx.send(serde_json::from_str(text.as_str()).unwrap());
                        }
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        Some(Ok(_)) => {}
                    },
                }
            }
        });

        Self {
            port,
            actions: action_tx,
            requests: request_rx,
            uri: Some(uri_rx),
        }
    }

    /// Path and query the client used for the handshake.
    pub async fn handshake_uri(&mut self) -> String {
        let uri = self.uri.take().expect("handshake uri already taken");
        tokio::time::timeout(WAIT, uri)
            .await
            .expect("no handshake")
            .unwrap()
    }

    pub fn send_raw(&self, text: impl Into<String>) {
        self.actions.send(DeviceAction::Send(text.into())).unwrap();
    }

    pub fn send_event(&self, event: &str) {
        self.send_raw(json!({ "event": event, "data": {} }).to_string());
    }

    /// Push a `d2d_service_message` whose data is JSON text, as real devices do.
    pub fn send_service(&self, data: Value) {
        self.send_raw(
            json!({ "event": "d2d_service_message", "data": data.to_string() }).to_string(),
        );
    }

    pub fn close(&self) {
        let _ = self.actions.send(DeviceAction::Close);
    }

    /// Next art-app request, unwrapped from its envelope.
    pub async fn next_request(&mut self) -> Value {
        let outer = tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("device connection ended");

        assert_eq!(outer["method"], "ms.channel.emit");
        assert_eq!(outer["params"]["event"], "art_app_request");
        assert_eq!(outer["params"]["to"], "host");
        serde_json::from_str(outer["params"]["data"].as_str().unwrap()).unwrap()
    }

    /// Nothing arrives within `within`.
    pub async fn assert_no_request(&mut self, within: Duration) {
        if let Ok(Some(request)) = tokio::time::timeout(within, self.requests.recv()).await {
            panic!("unexpected request: {request}");
        }
    }
}

/// Connect `session` to `device` and consume the three post-ready requests.
pub async fn connect_ready(
    session: &FrameSession,
    notifications: &mut broadcast::Receiver<FrameNotification>,
    device: &mut FakeDevice,
) {
    session.set_target_address(DEVICE_HOST).unwrap();
    session.connect().unwrap();

    next_matching(notifications, |n| {
        matches!(n, FrameNotification::DeviceInfoUpdated(_))
    })
    .await;
    wait_for_snapshot(session, |s| s.is_connected()).await;

    device.send_event("ms.channel.connect");
    device.send_event("ms.channel.ready");
    next_matching(notifications, |n| {
        matches!(n, FrameNotification::ConnectionChanged(true))
    })
    .await;

    for expected in ["get_api_version", "get_device_info", "get_artmode_status"] {
        assert_eq!(device.next_request().await["request"], expected);
    }
}

// ============================================
// WAITERS
// ============================================

/// Skip notifications until one matches `predicate`.
pub async fn next_matching<F>(
    notifications: &mut broadcast::Receiver<FrameNotification>,
    predicate: F,
) -> FrameNotification
where
    F: Fn(&FrameNotification) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let notification = notifications.recv().await.expect("notification stream ended");
            if predicate(&notification) {
                return notification;
            }
        }
    })
    .await
    .expect("timed out waiting for notification")
}

/// Poll the published snapshot until `predicate` holds.
pub async fn wait_for_snapshot<F>(session: &FrameSession, predicate: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let snapshot = session.snapshot().await;
            if predicate(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

// ============================================
// TRANSFER ENDPOINTS
// ============================================

/// Serve `bytes` to the first connection, one byte per write.
pub async fn serve_bytewise(bytes: Vec<u8>) -> (TransferEndpoint, JoinHandle<()>) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let endpoint = TransferEndpoint {
        ip: DEVICE_HOST.to_string(),
        port: listener.local_addr().unwrap().port(),
    };

    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.set_nodelay(true).unwrap();
        for byte in bytes {
            if stream.write_all(&[byte]).await.is_err() {
                return;
            }
            stream.flush().await.unwrap();
        }
        let _ = stream.shutdown().await;
    });

    (endpoint, task)
}

/// Accept one connection and collect everything written to it.
pub async fn capture_upload() -> (TransferEndpoint, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let endpoint = TransferEndpoint {
        ip: DEVICE_HOST.to_string(),
        port: listener.local_addr().unwrap().port(),
    };

    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        received
    });

    (endpoint, task)
}

/// A framed thumbnail as the device sends it.
pub fn thumbnail_frame(file_id: &str, file_type: &str, payload: &[u8]) -> Vec<u8> {
    let header = json!({
        "fileName": format!("{file_id}.{file_type}"),
        "fileType": file_type,
        "fileID": file_id,
        "fileLength": payload.len(),
    });
    frame_core::transfer::encode_frame(&header, payload).unwrap()
}
