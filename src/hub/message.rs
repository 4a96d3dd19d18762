//! Outbound message definitions
//!
//! `ServerMessage` is everything the hub ever writes to a client, tagged by
//! `type` on the wire:
//!
//! ```json
//! {"type":"price_update","symbol":"005930","price":71000.0,"timestamp":1725000000000}
//! ```
//!
//! Timestamps are milliseconds since the UNIX epoch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        message: String,
        timestamp: i64,
        connections: usize,
    },
    Subscribed {
        symbols: Vec<String>,
        subscriptions: Vec<String>,
    },
    Unsubscribed {
        symbols: Vec<String>,
        subscriptions: Vec<String>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },
    PriceUpdate {
        symbol: String,
        price: f64,
        timestamp: i64,
    },
    PriceAlert {
        symbol: String,
        reason: String,
        threshold: f64,
        price: f64,
        timestamp: i64,
    },
    MarketAlert {
        scope: String,
        reason: String,
        threshold: f64,
        timestamp: i64,
    },
    Heartbeat {
        timestamp: i64,
    },
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl ServerMessage {
    pub fn welcome(connections: usize) -> Self {
        Self::Welcome {
            message: "Connected to the real-time quote stream".to_string(),
            timestamp: now_millis(),
            connections,
        }
    }

    pub fn error(message: impl Into<String>, action: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            action,
        }
    }

    pub fn price_update(symbol: impl Into<String>, price: f64) -> Self {
        Self::PriceUpdate {
            symbol: symbol.into(),
            price,
            timestamp: now_millis(),
        }
    }

    pub fn price_alert(
        symbol: impl Into<String>,
        reason: impl Into<String>,
        threshold: f64,
        price: f64,
    ) -> Self {
        Self::PriceAlert {
            symbol: symbol.into(),
            reason: reason.into(),
            threshold,
            price,
            timestamp: now_millis(),
        }
    }

    pub fn market_alert(scope: impl Into<String>, reason: impl Into<String>, threshold: f64) -> Self {
        Self::MarketAlert {
            scope: scope.into(),
            reason: reason.into(),
            threshold,
            timestamp: now_millis(),
        }
    }

    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: now_millis(),
        }
    }

    /// The wire name carried in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
            Self::Error { .. } => "error",
            Self::PriceUpdate { .. } => "price_update",
            Self::PriceAlert { .. } => "price_alert",
            Self::MarketAlert { .. } => "market_alert",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}
