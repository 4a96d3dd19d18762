//! The `transport` module handles network communication with clients over
//! WebSockets.
//!
//! It defines the client control protocol, applies control frames to the
//! hub, and runs the WebSocket server that owns the sockets.

pub mod message;
pub mod protocol;
pub mod websocket;

pub use message::ClientMessage;
pub use websocket::start_websocket_server;

#[cfg(test)]
mod websocket_tests;
