//! WebSocket transport
//!
//! Accepts TCP connections, upgrades them to WebSockets and connects each one
//! to the `Hub`:
//! - a writer task drains the connection's channel into the socket
//! - the accept task reads frames, runs them through the subscription
//!   protocol and queues the reply
//!
//! A connection ends when either side notices first. A failed write, a read
//! error and a client close all call `Hub::deregister`, which only acts once.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::Connection;
use crate::config::{HubSettings, Settings};
use crate::hub::{Hub, ServerMessage};
use crate::transport::protocol::{handle_frame, invalid_frame};
use crate::utils::error::ServerError;

pub async fn start_websocket_server(
    addr: String,
    hub: Hub,
    settings: Settings,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("WebSocket server listening on ws://{addr}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("{}", ServerError::Accept(e));
                continue;
            }
        };
        let hub = hub.clone();
        let limits = settings.hub.clone();

        tokio::spawn(async move {
            handle_connection(stream, peer, hub, limits).await;
        });
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, hub: Hub, limits: HubSettings) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = mpsc::channel::<WsMessage>(limits.send_queue_capacity.max(1));
    let connection = Connection::new(tx);
    let id = connection.id.clone();

    // Queues the welcome on success, so the writer below sends it first.
    if let Err(e) = hub.try_register(connection, limits.max_connections) {
        debug!(connection = %id, %peer, "rejecting client: {e}");
        let reply = ServerMessage::error(e.to_string(), None);
        if let Ok(json) = serde_json::to_string(&reply) {
            let _ = ws_sender.send(WsMessage::text(json)).await;
        }
        let _ = ws_sender.close().await;
        return;
    }
    info!(connection = %id, %peer, "client connected");

    {
        let hub = hub.clone();
        let id = id.clone();

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = ws_sender.send(frame).await {
                    warn!(connection = %id, "failed to write to socket: {e}");
                    break;
                }
            }

            hub.deregister(&id);
            let _ = ws_sender.close().await;
            debug!(connection = %id, "send loop closed");
        });
    }

    while let Some(result) = ws_receiver.next().await {
        let reply = match result {
            Ok(WsMessage::Text(text)) => handle_frame(&hub, &id, text.as_str()),
            Ok(WsMessage::Binary(_)) => invalid_frame(),
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(connection = %id, "read error: {e}");
                break;
            }
        };
        hub.send_to(&id, &reply);
    }

    hub.deregister(&id);
    info!(connection = %id, "client disconnected");
}
