//! The `client` module defines the hub's view of a connected client.
//!
//! A `Connection` is the sending half of the per-connection channel plus the
//! id the registry indexes it by. The socket itself stays with the transport.

pub mod connection;
pub use connection::{Connection, ConnectionId};

#[cfg(test)]
mod tests;
