use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::utils::error::{SendFailed, SendFailure};

pub type ConnectionId = String;

/// A live client connection as seen by the hub.
///
/// Cloning is cheap (it clones the channel sender), which is what broadcast
/// snapshots rely on. The channel is bounded: a client that stops reading
/// fills it up and its next send fails instead of queueing forever.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier assigned at accept time.
    pub id: ConnectionId,

    /// Channel drained by the connection's socket writer task.
    sender: Sender<WsMessage>,
}

impl Connection {
    /// Create a connection around a sender channel with a fresh `conn-<uuid>` id.
    pub fn new(sender: Sender<WsMessage>) -> Self {
        Self::with_id(format!("conn-{}", Uuid::new_v4()), sender)
    }

    pub fn with_id(id: impl Into<ConnectionId>, sender: Sender<WsMessage>) -> Self {
        Self {
            id: id.into(),
            sender,
        }
    }

    /// Queue a frame for the writer task without waiting.
    ///
    /// Fails when the socket is closed or the client's queue is full.
    pub fn send(&self, frame: WsMessage) -> Result<(), SendFailed> {
        self.sender.try_send(frame).map_err(|e| SendFailed {
            connection_id: self.id.clone(),
            cause: match e {
                TrySendError::Full(_) => SendFailure::QueueFull,
                TrySendError::Closed(_) => SendFailure::Closed,
            },
        })
    }
}
