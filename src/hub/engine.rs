//! Hub engine
//!
//! `Hub` is the handle every collaborator gets: the WebSocket transport, the
//! heartbeat task and whatever produces price alerts. It wraps the
//! `Registry` in one lock and adds message delivery on top.
//!
//! Concurrency and usage notes:
//! - Each registry operation takes the lock once and releases it before
//!   returning. No caller ever holds it across two operations.
//! - Fan-out copies the recipient handles under the lock and sends after the
//!   lock is released. A connection that disconnects after the copy may still
//!   see one failed send; that send just deregisters it again (a no-op).
//! - Registration, the connection limit check and the welcome frame are one
//!   transition, so no broadcast can reach a connection before its welcome.
//! - Sending is a non-blocking push into the connection's bounded channel, so
//!   a slow socket only ever stalls its own writer task. A client that lets
//!   its queue fill up is treated like a closed one.
//! - A failed send is never retried. Its only consequence is `deregister`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::{Connection, ConnectionId};
use crate::hub::message::ServerMessage;
use crate::hub::registry::Registry;
use crate::utils::error::RegisterError;

/// Point-in-time view of the hub, for status endpoints and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubStatus {
    pub connections: usize,
    pub topics: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Hub {
    registry: Arc<Mutex<Registry>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Registry methods never panic midway, so a poisoned lock still
        // guards a consistent registry.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new connection and greet it with the live connection count.
    ///
    /// Duplicate ids are ignored. Use [`Hub::try_register`] to enforce a
    /// connection limit.
    pub fn register(&self, connection: Connection) {
        let _ = self.try_register(connection, usize::MAX);
    }

    /// Register a connection unless `max_connections` are already live.
    ///
    /// The limit check, the insert and queueing the `welcome` frame all
    /// happen under one registry guard. Returns the live count including the
    /// new connection.
    pub fn try_register(
        &self,
        connection: Connection,
        max_connections: usize,
    ) -> Result<usize, RegisterError> {
        let id = connection.id.clone();
        let outcome = {
            let mut registry = self.registry();
            match registry.try_register(connection.clone(), max_connections) {
                Ok(count) => match encode(&ServerMessage::welcome(count)) {
                    Some(frame) => match connection.send(frame) {
                        Ok(()) => Ok(count),
                        Err(e) => {
                            registry.deregister(&id);
                            Err(RegisterError::from(e))
                        }
                    },
                    None => Ok(count),
                },
                Err(e) => Err(e),
            }
        };

        match &outcome {
            Ok(count) => info!(connection = %id, connections = count, "connection registered"),
            Err(RegisterError::LimitReached) => {
                warn!(connection = %id, max_connections, "connection limit reached")
            }
            Err(e) => warn!(connection = %id, "registration failed: {e}"),
        }
        outcome
    }

    /// Remove a connection from the hub and from every topic it followed.
    ///
    /// Safe to call from any number of cleanup paths; only the first call
    /// returns `true`.
    pub fn deregister(&self, id: &ConnectionId) -> bool {
        let (removed, count) = {
            let mut registry = self.registry();
            let removed = registry.deregister(id);
            (removed, registry.connection_count())
        };
        if removed {
            info!(connection = %id, connections = count, "connection deregistered");
        }
        removed
    }

    /// Add `topic` to a registered connection's subscriptions.
    ///
    /// Returns `false` for unknown connections and for topics the connection
    /// already follows.
    pub fn subscribe(&self, id: &ConnectionId, topic: &str) -> bool {
        let mut registry = self.registry();
        if !registry.contains(id) {
            debug!(connection = %id, topic, "subscribe for unknown connection ignored");
            return false;
        }
        registry.subscribe(id, topic)
    }

    /// Drop `topic` from a connection's subscriptions. The topic itself goes
    /// away with its last subscriber.
    pub fn unsubscribe(&self, id: &ConnectionId, topic: &str) -> bool {
        self.registry().unsubscribe(id, topic)
    }

    /// Sorted topics the connection follows; empty for unknown connections.
    pub fn subscriptions_of(&self, id: &ConnectionId) -> Vec<String> {
        self.registry().subscriptions_of(id)
    }

    /// Sorted topics with at least one subscriber.
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.registry().subscribed_topics()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry().subscriber_count(topic)
    }

    pub fn connection_count(&self) -> usize {
        self.registry().connection_count()
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self, id: &ConnectionId) -> bool {
        self.registry().contains(id)
    }

    /// Connection count and per-topic subscriber counts, taken under one guard.
    pub fn status(&self) -> HubStatus {
        let registry = self.registry();
        HubStatus {
            connections: registry.connection_count(),
            topics: registry
                .topic_counts()
                .map(|(name, count)| (name.clone(), count))
                .collect(),
        }
    }

    /// Deliver one message to one connection.
    ///
    /// Returns `false` when the connection is unknown or the send failed; a
    /// failed send deregisters the connection.
    pub fn send_to(&self, id: &ConnectionId, message: &ServerMessage) -> bool {
        let connection = self.registry().connection(id);
        let Some(connection) = connection else {
            debug!(connection = %id, kind = message.kind(), "send to unknown connection dropped");
            return false;
        };
        match encode(message) {
            Some(frame) => self.deliver(&connection, frame),
            None => false,
        }
    }

    /// Deliver a message to every live connection. Returns the number of
    /// successful deliveries.
    pub fn broadcast_all(&self, message: &ServerMessage) -> usize {
        let recipients = self.registry().all_connections();
        let delivered = self.fan_out(&recipients, message);
        debug!(
            kind = message.kind(),
            recipients = recipients.len(),
            delivered,
            "broadcast to all"
        );
        delivered
    }

    /// Deliver a message to every subscriber of `topic`. Unknown topics are a
    /// no-op. Returns the number of successful deliveries.
    pub fn broadcast_to_topic(&self, topic: &str, message: &ServerMessage) -> usize {
        let recipients = self.registry().subscribers_of(topic);
        if recipients.is_empty() {
            debug!(topic, kind = message.kind(), "no subscribers");
            return 0;
        }
        let delivered = self.fan_out(&recipients, message);
        debug!(
            topic,
            kind = message.kind(),
            recipients = recipients.len(),
            delivered,
            "broadcast to topic"
        );
        delivered
    }

    fn fan_out(&self, recipients: &[Connection], message: &ServerMessage) -> usize {
        if recipients.is_empty() {
            return 0;
        }
        let Some(frame) = encode(message) else {
            return 0;
        };
        recipients
            .iter()
            .filter(|connection| self.deliver(connection, frame.clone()))
            .count()
    }

    fn deliver(&self, connection: &Connection, frame: WsMessage) -> bool {
        match connection.send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(connection = %connection.id, "{e}");
                self.deregister(&connection.id);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.registry().assert_consistent();
    }
}

fn encode(message: &ServerMessage) -> Option<WsMessage> {
    match serde_json::to_string(message) {
        Ok(json) => Some(WsMessage::text(json)),
        Err(e) => {
            error!(kind = message.kind(), "failed to serialize message: {e}");
            None
        }
    }
}
