use serde::Deserialize;
use serde_json::Value;

use crate::utils::error::FrameError;

/// A control frame sent by a client.
///
/// ```json
/// {"action":"subscribe","symbols":["005930","AAPL"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe { symbols: Vec<String> },
    Unsubscribe { symbols: Vec<String> },
}

impl ClientMessage {
    /// Parse one inbound text frame.
    ///
    /// The action is looked at before the payload so that it can be echoed
    /// back in the error reply, both for unknown actions and for known ones
    /// with a bad payload.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: Value =
            serde_json::from_str(text).map_err(|_| FrameError::InvalidFormat(None))?;
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(FrameError::InvalidFormat(None))?;

        if !matches!(action.as_str(), "subscribe" | "unsubscribe") {
            return Err(FrameError::UnsupportedAction(action));
        }
        serde_json::from_value(value).map_err(|_| FrameError::InvalidFormat(Some(action)))
    }
}
