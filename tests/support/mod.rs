//! In-process mock of the control server for integration tests.
//!
//! `POST /jsonrpc` answers commands according to the configured [`Reply`]
//! and records every request. `GET /jsonrpc` upgrades to a WebSocket that
//! plays the [`Action`]s the test pushes through [`MockServer::push`].
//!
//! [`serve_once`] is a bare WebSocket peer for byte-level frames the axum
//! socket refuses to send: invalid UTF-8, or data after a close frame.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;

pub type RawSocket = WebSocketStream<TcpStream>;

/// How the command endpoint answers.
#[derive(Clone, Debug)]
pub enum Reply {
    /// `{"id", "jsonrpc", "result": value}`.
    Result(Value),
    /// `{"id", "jsonrpc", "error": {code, message}}`.
    Error { code: i64, message: String },
    /// Bare HTTP status, empty body.
    Status(StatusCode),
}

/// One scripted step on the notification socket.
#[derive(Debug)]
pub enum Action {
    Text(String),
    Close { code: u16, reason: String },
    /// Drop the socket without a close handshake.
    Drop,
}

/// A command request as the server saw it.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub body: Value,
    pub accept: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
struct Mock {
    reply: Arc<Mutex<Reply>>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    actions: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Action>>>,
    connected: mpsc::UnboundedSender<()>,
}

pub struct MockServer {
    pub host: String,
    mock: Mock,
    actions: mpsc::UnboundedSender<Action>,
    connected: tokio::sync::Mutex<mpsc::UnboundedReceiver<()>>,
}

impl MockServer {
    pub async fn start() -> Self {
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = mpsc::unbounded_channel();
        let mock = Mock {
            reply: Arc::new(Mutex::new(Reply::Result(json!({})))),
            recorded: Arc::new(Mutex::new(Vec::new())),
            actions: Arc::new(tokio::sync::Mutex::new(actions_rx)),
            connected: connected_tx,
        };

        let app = Router::new()
            .route("/jsonrpc", post(command).get(upgrade))
            .with_state(mock.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let host = listener.local_addr().expect("mock address").to_string();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server failed");
        });

        Self {
            host,
            mock,
            actions: actions_tx,
            connected: tokio::sync::Mutex::new(connected_rx),
        }
    }

    pub fn reply(&self, reply: Reply) {
        *self.mock.reply.lock().unwrap_or_else(PoisonError::into_inner) = reply;
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.mock
            .recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn push(&self, action: Action) {
        self.actions.send(action).expect("mock socket task alive");
    }

    pub fn notify(&self, method: &str, params: Value) {
        self.push(Action::Text(
            json!({ "jsonrpc": "2.0", "method": method, "params": params }).to_string(),
        ));
    }

    /// Wait until the server side of a notification socket is running.
    pub async fn wait_connected(&self) {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.connected.lock().await.recv())
            .await
            .expect("socket connect timed out")
            .expect("mock server gone");
    }
}

async fn command(State(mock): State<Mock>, headers: HeaderMap, body: Bytes) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    };
    mock.recorded
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(Recorded {
            body: body.clone(),
            accept: header("accept"),
            content_type: header("content-type"),
        });

    let id = body.get("id").cloned().unwrap_or(Value::Null);
    let reply = mock.reply.lock().unwrap_or_else(PoisonError::into_inner).clone();
    match reply {
        Reply::Result(result) => {
            axum::Json(json!({ "id": id, "jsonrpc": "2.0", "result": result })).into_response()
        }
        Reply::Error { code, message } => axum::Json(json!({
            "id": id,
            "jsonrpc": "2.0",
            "error": { "code": code, "message": message },
        }))
        .into_response(),
        Reply::Status(status) => status.into_response(),
    }
}

async fn upgrade(State(mock): State<Mock>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| play(mock, socket))
}

async fn play(mock: Mock, mut socket: WebSocket) {
    let mut actions = mock.actions.lock().await;
    let _ = mock.connected.send(());

    loop {
        tokio::select! {
            action = actions.recv() => match action {
                Some(Action::Text(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        return;
                    }
                }
                Some(Action::Close { code, reason }) => {
                    let frame = CloseFrame { code, reason: reason.into() };
                    let _ = socket.send(Message::Close(Some(frame))).await;
                    drain(&mut socket).await;
                    return;
                }
                Some(Action::Drop) | None => return,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_)) | Err(_)) | None => {
                    drain(&mut socket).await;
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Read until the peer finishes the closing handshake.
async fn drain(socket: &mut WebSocket) {
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), async {
        while let Some(Ok(_)) = socket.recv().await {}
    })
    .await;
}

// =============================================================================
// RAW PEER
// =============================================================================

/// Accept one WebSocket connection and run `script` on it. Returns the host.
pub async fn serve_once<F, Fut>(script: F) -> String
where
    F: FnOnce(RawSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind raw peer");
    let host = listener.local_addr().expect("raw peer address").to_string();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let socket = tokio_tungstenite::accept_async(tcp).await.expect("handshake");
        script(socket).await;
    });
    host
}

/// Write one unmasked, final text frame straight to the TCP stream.
pub async fn write_raw_text(socket: &mut RawSocket, payload: &[u8]) {
    let len = u8::try_from(payload.len())
        .ok()
        .filter(|len| *len < 126)
        .expect("payload fits a one-byte length");
    let mut frame = vec![0x81, len];
    frame.extend_from_slice(payload);
    let tcp = socket.get_mut();
    tcp.write_all(&frame).await.expect("raw write");
    tcp.flush().await.expect("raw flush");
}

/// Read until the client hangs up.
pub async fn drain_raw(socket: &mut RawSocket) {
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), async {
        while let Some(Ok(_)) = socket.next().await {}
    })
    .await;
}

pub fn volume_notification(percent: u16) -> String {
    json!({
        "jsonrpc": "2.0",
        "method": "Client.OnVolumeChanged",
        "params": { "id": "c", "volume": { "muted": false, "percent": percent } },
    })
    .to_string()
}
