//! The hub keeps track of live connections and the stock symbols they follow,
//! and fans messages out to them.
//!
//! - `registry`: connection lifetime plus both subscription views
//! - `topic`: symbol → subscriber index, pruned when a topic empties
//! - `engine`: the shared `Hub` handle; locking and delivery
//! - `message`: everything the hub writes to clients
//! - `heartbeat`: periodic keep-alive broadcast

pub mod engine;
pub mod heartbeat;
pub mod message;
pub mod registry;
pub mod topic;

pub use engine::{Hub, HubStatus};
pub use message::ServerMessage;
