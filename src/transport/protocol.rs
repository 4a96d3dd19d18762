//! Subscription protocol
//!
//! Turns one inbound client frame into registry mutations and the reply for
//! the sender. There is a single connection state: a connection may
//! subscribe or unsubscribe at any time until it is deregistered.
//!
//! Malformed frames and unknown actions only produce an `error` reply; they
//! never touch the hub.

use tracing::debug;

use crate::client::ConnectionId;
use crate::hub::{Hub, ServerMessage};
use crate::transport::message::ClientMessage;
use crate::utils::error::FrameError;

/// Apply one text frame from `id` and return the reply to send back to it.
pub fn handle_frame(hub: &Hub, id: &ConnectionId, text: &str) -> ServerMessage {
    match ClientMessage::parse(text) {
        Ok(ClientMessage::Subscribe { symbols }) => {
            for symbol in &symbols {
                hub.subscribe(id, symbol);
            }
            debug!(connection = %id, ?symbols, "subscribed");
            ServerMessage::Subscribed {
                subscriptions: hub.subscriptions_of(id),
                symbols,
            }
        }
        Ok(ClientMessage::Unsubscribe { symbols }) => {
            for symbol in &symbols {
                hub.unsubscribe(id, symbol);
            }
            debug!(connection = %id, ?symbols, "unsubscribed");
            ServerMessage::Unsubscribed {
                subscriptions: hub.subscriptions_of(id),
                symbols,
            }
        }
        Err(err) => {
            let preview: String = text.chars().take(100).collect();
            debug!(connection = %id, frame = %preview, "rejected client frame: {err}");
            error_reply(err)
        }
    }
}

/// Reply for a frame that is not text.
pub fn invalid_frame() -> ServerMessage {
    error_reply(FrameError::InvalidFormat(None))
}

fn error_reply(err: FrameError) -> ServerMessage {
    let action = err.action().map(str::to_owned);
    ServerMessage::error(err.to_string(), action)
}
