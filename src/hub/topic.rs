//! Topic index
//!
//! A `Topic` holds the set of connection ids subscribed to one stock symbol.
//! `TopicIndex` maps symbol → `Topic` and never keeps an empty topic around:
//! the entry is dropped as soon as its last subscriber leaves.
//!
//! Concurrency note: the index is owned by the `Registry` and is only touched
//! under the hub lock.

use std::collections::{HashMap, HashSet};

use crate::client::ConnectionId;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: HashSet<ConnectionId>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashSet::new(),
        }
    }

    /// Add a subscriber to the topic. Duplicate adds are ignored.
    pub fn subscribe(&mut self, id: ConnectionId) -> bool {
        self.subscribers.insert(id)
    }

    /// Remove a subscriber from the topic.
    pub fn unsubscribe(&mut self, id: &ConnectionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TopicIndex {
    topics: HashMap<String, Topic>,
}

impl TopicIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to the subscribers of `topic`, creating the topic if needed.
    pub fn insert(&mut self, topic: &str, id: ConnectionId) -> bool {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(id)
    }

    /// Remove `id` from `topic`, pruning the topic once it is empty.
    pub fn remove(&mut self, topic: &str, id: &ConnectionId) -> bool {
        let Some(entry) = self.topics.get_mut(topic) else {
            return false;
        };
        let removed = entry.unsubscribe(id);
        if entry.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    pub fn get(&self, topic: &str) -> Option<&Topic> {
        self.topics.get(topic)
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, |t| t.subscribers.len())
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.topics.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.topics.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
