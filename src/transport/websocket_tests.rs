use crate::config::Settings;
use crate::hub::{Hub, ServerMessage};
use crate::transport::websocket::start_websocket_server;
use futures_util::future::join_all;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn setup_server(settings: Settings) -> (String, Hub) {
    let addr = format!(
        "127.0.0.1:{}",
        portpicker::pick_unused_port().expect("No free ports")
    );
    let hub = Hub::new();

    tokio::spawn(start_websocket_server(addr.clone(), hub.clone(), settings));

    // Give the server a moment to start up
    tokio::time::sleep(Duration::from_millis(100)).await;

    (format!("ws://{addr}"), hub)
}

async fn connect(url: &str) -> Client {
    let (ws_stream, _) = connect_async(url).await.expect("WebSocket handshake failed");
    ws_stream
}

async fn next_message(ws_stream: &mut Client) -> ServerMessage {
    let response = tokio::time::timeout(Duration::from_secs(2), ws_stream.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("Did not receive response")
        .unwrap();
    let raw_data = response.into_data();
    serde_json::from_slice(&raw_data).unwrap_or_else(|e| {
        panic!(
            "Failed to deserialize ServerMessage from '{:?}': {}",
            raw_data, e
        );
    })
}

async fn send_json(ws_stream: &mut Client, value: serde_json::Value) {
    ws_stream
        .send(WsMessage::Text(value.to_string().into()))
        .await
        .expect("Failed to send frame");
}

async fn wait_for_connections(hub: &Hub, expected: usize) {
    for _ in 0..100 {
        if hub.connection_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "expected {expected} connections, hub has {}",
        hub.connection_count()
    );
}

#[tokio::test]
async fn test_welcome_on_connect() {
    let (url, hub) = setup_server(Settings::default()).await;
    let mut ws_stream = connect(&url).await;

    match next_message(&mut ws_stream).await {
        ServerMessage::Welcome { connections, .. } => assert_eq!(connections, 1),
        other => panic!("Expected Welcome, got {other:?}"),
    }
    assert_eq!(hub.connection_count(), 1);
}

#[tokio::test]
async fn test_subscribe_and_receive_price_update() {
    let (url, hub) = setup_server(Settings::default()).await;
    let mut c1 = connect(&url).await;
    let mut c2 = connect(&url).await;
    next_message(&mut c1).await;
    next_message(&mut c2).await;

    for ws_stream in [&mut c1, &mut c2] {
        send_json(ws_stream, json!({ "action": "subscribe", "symbols": ["005930"] })).await;
        match next_message(ws_stream).await {
            ServerMessage::Subscribed { subscriptions, .. } => {
                assert_eq!(subscriptions, vec!["005930"]);
            }
            other => panic!("Expected Subscribed, got {other:?}"),
        }
    }
    assert_eq!(hub.subscriber_count("005930"), 2);

    let update = ServerMessage::price_update("005930", 71000.0);
    assert_eq!(hub.broadcast_to_topic("005930", &update), 2);
    assert_eq!(next_message(&mut c1).await, update);
    assert_eq!(next_message(&mut c2).await, update);

    // C1 leaves; only C2 gets the next update
    c1.close(None).await.expect("Failed to close WebSocket");
    wait_for_connections(&hub, 1).await;
    assert_eq!(hub.subscriber_count("005930"), 1);

    let update = ServerMessage::price_update("005930", 71500.0);
    assert_eq!(hub.broadcast_to_topic("005930", &update), 1);
    assert_eq!(next_message(&mut c2).await, update);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let (url, hub) = setup_server(Settings::default()).await;
    let mut ws_stream = connect(&url).await;
    next_message(&mut ws_stream).await;

    send_json(&mut ws_stream, json!({ "action": "subscribe" })).await;
    assert_eq!(
        next_message(&mut ws_stream).await,
        ServerMessage::error("invalid format", Some("subscribe".to_string()))
    );

    send_json(&mut ws_stream, json!({ "action": "ping", "symbols": [] })).await;
    match next_message(&mut ws_stream).await {
        ServerMessage::Error { action, .. } => assert_eq!(action.as_deref(), Some("ping")),
        other => panic!("Expected Error, got {other:?}"),
    }

    // still registered and still usable
    assert_eq!(hub.connection_count(), 1);
    assert!(hub.subscribed_topics().is_empty());
    send_json(&mut ws_stream, json!({ "action": "subscribe", "symbols": ["AAPL"] })).await;
    assert!(matches!(
        next_message(&mut ws_stream).await,
        ServerMessage::Subscribed { .. }
    ));
}

#[tokio::test]
async fn test_disconnect_removes_subscriptions() {
    let (url, hub) = setup_server(Settings::default()).await;
    let mut ws_stream = connect(&url).await;
    next_message(&mut ws_stream).await;

    send_json(&mut ws_stream, json!({ "action": "subscribe", "symbols": ["AAPL", "TSLA"] })).await;
    next_message(&mut ws_stream).await;
    assert_eq!(hub.subscribed_topics(), vec!["AAPL", "TSLA"]);

    drop(ws_stream);

    wait_for_connections(&hub, 0).await;
    assert!(hub.subscribed_topics().is_empty());
    hub.assert_consistent();
}

#[tokio::test]
async fn test_connection_limit() {
    let mut settings = Settings::default();
    settings.hub.max_connections = 1;
    let (url, hub) = setup_server(settings).await;

    let mut first = connect(&url).await;
    next_message(&mut first).await;

    let mut second = connect(&url).await;
    assert_eq!(
        next_message(&mut second).await,
        ServerMessage::error("connection limit reached", None)
    );
    assert_eq!(hub.connection_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_connection_limit_holds_under_concurrent_connects() {
    const CLIENTS: usize = 16;

    let mut settings = Settings::default();
    settings.hub.max_connections = 1;
    settings.hub.heartbeat_interval_secs = 0;
    let (url, hub) = setup_server(settings).await;

    for _ in 0..10 {
        let attempts = (0..CLIENTS).map(|_| {
            let url = url.clone();
            tokio::spawn(async move {
                let mut ws_stream = connect(&url).await;
                let first = next_message(&mut ws_stream).await;
                (first, ws_stream)
            })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.expect("client task panicked"))
            .collect();

        let welcomed = results
            .iter()
            .filter(|(first, _)| matches!(first, ServerMessage::Welcome { .. }))
            .count();
        assert_eq!(welcomed, 1);
        for (first, _) in &results {
            if !matches!(first, ServerMessage::Welcome { .. }) {
                assert_eq!(
                    *first,
                    ServerMessage::error("connection limit reached", None)
                );
            }
        }
        assert_eq!(hub.connection_count(), 1);

        drop(results);
        wait_for_connections(&hub, 0).await;
    }
    hub.assert_consistent();
}
