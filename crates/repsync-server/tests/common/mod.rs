use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use repsync_core::net::messages::WsMessage;
use repsync_server::build_app;
use repsync_server::config::{BotFillConfig, LimitsConfig, ServerConfig};
use repsync_server::state::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with defaults.
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    /// Start a test server with custom infrastructure limits.
    pub async fn with_limits(limits: LimitsConfig) -> Self {
        let config = ServerConfig {
            limits,
            ..ServerConfig::default()
        };
        Self::from_config(config).await
    }

    /// Start a test server with a fast bot-fill delay.
    pub async fn with_bot_fill(min_players: usize, fill_delay_ms: u64) -> Self {
        let config = ServerConfig {
            bots: BotFillConfig {
                min_players,
                fill_delay_ms,
            },
            ..ServerConfig::default()
        };
        Self::from_config(config).await
    }

    async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, room_code: &str, session_id: &str) -> String {
        format!(
            "ws://{}/ws?roomCode={room_code}&sessionId={session_id}",
            self.addr
        )
    }

    pub fn ws_url_bare(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Create a room over REST. Returns (room_code, token, host_player_id).
pub async fn http_create_room(base_url: &str, host_name: &str, public: bool) -> (String, String, i64) {
    let body = serde_json::json!({
        "settings": {
            "focusArea": "total",
            "burnoutType": "classic",
            "roundTime": 60,
            "rounds": 3,
            "restTime": 30
        },
        "isPublic": public,
        "hostName": host_name
    });
    let resp = reqwest::Client::new()
        .post(format!("{base_url}/api/rooms"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "create room failed");
    let json: serde_json::Value = resp.json().await.unwrap();
    (
        json["code"].as_str().unwrap().to_string(),
        json["token"].as_str().unwrap().to_string(),
        json["players"][0]["id"].as_i64().unwrap(),
    )
}

/// Join a room over REST. Returns (token, player_id).
pub async fn http_join_room(base_url: &str, code: &str, player_name: &str) -> (String, i64) {
    let body = serde_json::json!({ "code": code, "playerName": player_name });
    let resp = reqwest::Client::new()
        .post(format!("{base_url}/api/rooms/join"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "join room failed");
    let json: serde_json::Value = resp.json().await.unwrap();
    (
        json["token"].as_str().unwrap().to_string(),
        json["player"]["id"].as_i64().unwrap(),
    )
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Send a raw text frame.
pub async fn ws_send_raw(stream: &mut WsStream, text: &str) {
    stream
        .send(Message::Text(text.to_string().into()))
        .await
        .unwrap();
}

/// Send an encoded WsMessage.
pub async fn ws_send_msg(stream: &mut WsStream, msg: &WsMessage) {
    ws_send_raw(stream, &msg.encode().unwrap()).await;
}

/// Read the next text frame (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> String {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read a text frame, returning None on timeout.
pub async fn ws_try_read_raw(stream: &mut WsStream, timeout_ms: u64) -> Option<String> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Read the next frame and decode it (5s timeout).
pub async fn ws_read_msg(stream: &mut WsStream) -> WsMessage {
    let text = ws_read_raw(stream).await;
    WsMessage::decode(&text).unwrap_or_else(|e| panic!("undecodable frame {text}: {e}"))
}

/// Wait for the connection to be refused, returning the close code.
pub async fn ws_expect_close(stream: &mut WsStream) -> u16 {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Close(Some(frame)))) => return u16::from(frame.code),
                Some(Ok(Message::Close(None))) => panic!("Close frame without code"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended without close frame"),
            }
        }
    })
    .await
    .expect("Timed out waiting for close frame")
}
