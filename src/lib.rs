//! # QuoteHub
//!
//! `quotehub` is an in-memory, real-time subscription hub for stock quotes.
//! Clients connect over WebSockets, subscribe to symbols, and receive price
//! updates and alerts pushed by whatever service watches the market.
//!
//! ## Core Modules
//!
//! - `hub`: the connection registry, the symbol → subscriber index and message fan-out.
//! - `client`: the hub's handle on one connected client.
//! - `config`: loading server and hub configuration.
//! - `transport`: the subscription protocol and the WebSocket server.
//! - `utils`: typed errors and logging setup.
//!
//! A `hub::Hub` is created once and cloned into every collaborator:
//!
//! ```no_run
//! use quotehub::hub::{Hub, ServerMessage};
//!
//! let hub = Hub::new();
//! // ... hand `hub.clone()` to the WebSocket server ...
//! hub.broadcast_to_topic("005930", &ServerMessage::price_update("005930", 71000.0));
//! ```

pub mod client;
pub mod config;
pub mod hub;
pub mod transport;
pub mod utils;
