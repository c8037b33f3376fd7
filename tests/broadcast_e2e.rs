//! End-to-end: real WebSocket clients connected through the transport
//! receive what the server multicasts.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use ws_multicast::app_state::AppState;
use ws_multicast::frame::CloseCode;
use ws_multicast::server::WsServer;
use ws_multicast::transport::{self, HandshakeLimits};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_server() -> (Arc<WsServer>, String) {
    let server = Arc::new(WsServer::default());
    assert!(server.start());
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(transport::serve(
        listener,
        Arc::clone(&server),
        HandshakeLimits::default(),
    ));
    (server, format!("ws://{addr}/"))
}

async fn connect(url: &str) -> Client {
    let Ok((client, _)) = connect_async(url).await else {
        panic!("client handshake failed");
    };
    client
}

async fn wait_for(server: &WsServer, total: usize, handshaked: usize) {
    let ready = tokio::time::timeout(WAIT, async {
        while server.session_count() != total || server.handshaked_count() != handshaked {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(ready.is_ok(), "sessions never reached {total}/{handshaked}");
}

async fn next_message(client: &mut Client) -> Message {
    let Ok(Some(Ok(msg))) = tokio::time::timeout(WAIT, client.next()).await else {
        panic!("no message received");
    };
    msg
}

#[tokio::test]
async fn clients_receive_text_and_binary() {
    let (server, url) = spawn_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    wait_for(&server, 2, 2).await;

    assert!(matches!(server.multicast_text("hello"), Ok(2)));
    assert!(matches!(server.multicast_binary([1u8, 2, 3]), Ok(2)));

    for client in [&mut a, &mut b] {
        assert_eq!(next_message(client).await, Message::text("hello"));
        assert_eq!(next_message(client).await, Message::binary(vec![1u8, 2, 3]));
    }
}

#[tokio::test]
async fn large_payload_uses_extended_length() {
    let (server, url) = spawn_server().await;
    let mut client = connect(&url).await;
    wait_for(&server, 1, 1).await;

    let payload = vec![0x5Au8; 70_000];
    assert!(matches!(server.multicast_binary(&payload), Ok(1)));
    assert_eq!(next_message(&mut client).await, Message::binary(payload));
}

#[tokio::test]
async fn ping_reaches_client() {
    let (server, url) = spawn_server().await;
    let mut client = connect(&url).await;
    wait_for(&server, 1, 1).await;

    assert!(matches!(server.send_ping("beat"), Ok(1)));
    assert_eq!(next_message(&mut client).await, Message::Ping("beat".into()));
}

#[tokio::test]
async fn pending_connection_is_skipped() {
    let (server, url) = spawn_server().await;
    let mut ready = connect(&url).await;
    let Some(addr) = url.strip_prefix("ws://").and_then(|s| s.strip_suffix('/')) else {
        panic!("unexpected url");
    };
    let Ok(mut raw) = TcpStream::connect(addr).await else {
        panic!("raw connect failed");
    };
    wait_for(&server, 2, 1).await;

    assert!(matches!(server.multicast_text("only-ready"), Ok(1)));
    assert_eq!(next_message(&mut ready).await, Message::text("only-ready"));

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_millis(200), raw.read(&mut buf)).await;
    assert!(read.is_err(), "pending connection must not receive frames");
}

#[tokio::test]
async fn close_all_sends_status_then_disconnects() {
    let (server, url) = spawn_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    wait_for(&server, 2, 2).await;

    assert!(matches!(server.close_all(CloseCode::GOING_AWAY), Ok(2)));
    assert_eq!(server.session_count(), 0);

    for client in [&mut a, &mut b] {
        let Message::Close(Some(frame)) = next_message(client).await else {
            panic!("expected close frame with status");
        };
        assert_eq!(u16::from(frame.code), 1001);
    }

    assert!(matches!(server.multicast_text("after"), Ok(0)));
}

#[tokio::test]
async fn stopped_server_refuses_connections() {
    let (server, url) = spawn_server().await;
    assert!(server.stop());

    let attempt = tokio::time::timeout(WAIT, connect_async(url.as_str())).await;
    assert!(matches!(attempt, Ok(Err(_))), "handshake must fail while stopped");
    assert_eq!(server.session_count(), 0);
}

#[tokio::test]
async fn admin_api_triggers_broadcast() {
    let (server, url) = spawn_server().await;
    let mut client = connect(&url).await;
    wait_for(&server, 1, 1).await;

    let app = ws_multicast::api::build_router().with_state(AppState {
        server: Arc::clone(&server),
    });
    let Ok(admin) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(admin_addr) = admin.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(admin, app).await;
    });

    let http = reqwest::Client::new();
    let Ok(resp) = http
        .post(format!("http://{admin_addr}/api/v1/broadcast/text"))
        .json(&serde_json::json!({ "payload": "via-api" }))
        .send()
        .await
    else {
        panic!("admin request failed");
    };
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let Ok(body) = resp.json::<serde_json::Value>().await else {
        panic!("bad admin response");
    };
    assert_eq!(body["delivered"], 1);

    assert_eq!(next_message(&mut client).await, Message::text("via-api"));
}
