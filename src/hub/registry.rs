//! Connection registry
//!
//! The registry owns every live connection, each connection's own topic set,
//! and the reverse `TopicIndex` used for fan-out. The two views are kept in
//! lockstep:
//!
//! - a topic is in a connection's set iff the connection is in that topic's
//!   subscriber set
//! - the index never holds an empty topic
//! - only registered connections appear in the index
//!
//! Every method is one complete transition, and callers hold the hub lock for
//! exactly one call. Nothing here performs I/O.

use std::collections::{BTreeSet, HashMap};

use crate::client::{Connection, ConnectionId};
use crate::hub::topic::TopicIndex;
use crate::utils::error::RegisterError;

#[derive(Debug)]
struct Entry {
    connection: Connection,
    topics: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Entry>,
    index: TopicIndex,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection with no subscriptions.
    ///
    /// Returns `false` and leaves the existing entry untouched if the id is
    /// already registered.
    pub fn register(&mut self, connection: Connection) -> bool {
        self.try_register(connection, usize::MAX).is_ok()
    }

    /// Add a connection unless the registry already holds `max_connections`
    /// entries or the id is taken. The capacity check and the insert are one
    /// transition. Returns the live count including the new connection.
    pub fn try_register(
        &mut self,
        connection: Connection,
        max_connections: usize,
    ) -> Result<usize, RegisterError> {
        if self.connections.contains_key(&connection.id) {
            return Err(RegisterError::Duplicate(connection.id));
        }
        if self.connections.len() >= max_connections {
            return Err(RegisterError::LimitReached);
        }
        self.connections.insert(
            connection.id.clone(),
            Entry {
                connection,
                topics: BTreeSet::new(),
            },
        );
        Ok(self.connections.len())
    }

    /// Remove a connection and all of its subscriptions.
    ///
    /// Idempotent: returns `true` only for the call that removed it.
    pub fn deregister(&mut self, id: &ConnectionId) -> bool {
        let Some(entry) = self.connections.remove(id) else {
            return false;
        };
        for topic in &entry.topics {
            self.index.remove(topic, id);
        }
        true
    }

    /// Subscribe a registered connection to `topic`.
    ///
    /// Unknown connections and repeated subscriptions are no-ops.
    pub fn subscribe(&mut self, id: &ConnectionId, topic: &str) -> bool {
        let Some(entry) = self.connections.get_mut(id) else {
            return false;
        };
        if !entry.topics.insert(topic.to_string()) {
            return false;
        }
        self.index.insert(topic, id.clone());
        true
    }

    pub fn unsubscribe(&mut self, id: &ConnectionId, topic: &str) -> bool {
        let Some(entry) = self.connections.get_mut(id) else {
            return false;
        };
        if !entry.topics.remove(topic) {
            return false;
        }
        self.index.remove(topic, id);
        true
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<Connection> {
        self.connections.get(id).map(|e| e.connection.clone())
    }

    /// The connection's effective subscription set, sorted.
    pub fn subscriptions_of(&self, id: &ConnectionId) -> Vec<String> {
        self.connections
            .get(id)
            .map(|e| e.topics.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sorted snapshot of every topic with at least one subscriber.
    pub fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.index.names().cloned().collect();
        topics.sort();
        topics
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.index.subscriber_count(topic)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Handles of every live connection, copied for snapshot iteration.
    pub fn all_connections(&self) -> Vec<Connection> {
        self.connections
            .values()
            .map(|e| e.connection.clone())
            .collect()
    }

    /// Handles of the subscribers of `topic`, copied for snapshot iteration.
    pub fn subscribers_of(&self, topic: &str) -> Vec<Connection> {
        self.index
            .get(topic)
            .map(|t| {
                t.subscribers
                    .iter()
                    .filter_map(|id| self.connection(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn topic_counts(&self) -> impl Iterator<Item = (&String, usize)> {
        self.index.iter().map(|t| (&t.name, t.subscribers.len()))
    }

    /// Panics if the two views have drifted apart.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (id, entry) in &self.connections {
            assert_eq!(&entry.connection.id, id);
            for topic in &entry.topics {
                let t = self
                    .index
                    .get(topic)
                    .unwrap_or_else(|| panic!("{id} lists {topic} but the index has no entry"));
                assert!(t.subscribers.contains(id), "{topic} is missing {id}");
            }
        }
        for topic in self.index.iter() {
            assert!(!topic.is_empty(), "empty topic {} was not pruned", topic.name);
            for id in &topic.subscribers {
                let entry = self
                    .connections
                    .get(id)
                    .unwrap_or_else(|| panic!("{} lists unregistered {id}", topic.name));
                assert!(entry.topics.contains(&topic.name));
            }
        }
    }
}
