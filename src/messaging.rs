/// Messages exchanged with the overlay content script over its tab port

use serde::Serialize;
use serde_json::Value;

use crate::preferences::OverlayConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("message has no name")]
    MissingName,
    #[error("unknown message name: {0}")]
    UnknownMessage(String),
}

/// Background page → content script
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum OutboundMessage {
    Available { count: usize, config: OverlayConfig },
    Active,
    Inactive,
}

/// Content script → background page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundMessage {
    /// Open the full chooser for the tab.
    OverlayClicked,
    /// The overlay display timer ran out.
    OverlayTimeout,
}

impl InboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            InboundMessage::OverlayClicked => "overlay-clicked",
            InboundMessage::OverlayTimeout => "overlay-timeout",
        }
    }

    pub fn from_value(message: &Value) -> Result<Self, ProtocolError> {
        let name = message
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingName)?;

        match name {
            "overlay-clicked" => Ok(InboundMessage::OverlayClicked),
            "overlay-timeout" => Ok(InboundMessage::OverlayTimeout),
            other => Err(ProtocolError::UnknownMessage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_available_wire_shape() {
        let message = OutboundMessage::Available {
            count: 2,
            config: OverlayConfig {
                show_for: 5000,
                wipe_white: true,
            },
        };

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "name": "available",
                "count": 2,
                "config": { "show_for": 5000, "wipe_white": true }
            })
        );
    }

    #[test]
    fn test_unit_messages_wire_shape() {
        assert_eq!(
            serde_json::to_value(OutboundMessage::Active).unwrap(),
            json!({ "name": "active" })
        );
        assert_eq!(
            serde_json::to_value(OutboundMessage::Inactive).unwrap(),
            json!({ "name": "inactive" })
        );
    }

    #[test]
    fn test_inbound_names() {
        for message in [InboundMessage::OverlayClicked, InboundMessage::OverlayTimeout] {
            let parsed = InboundMessage::from_value(&json!({ "name": message.name() }));
            assert_eq!(parsed, Ok(message));
        }
    }

    #[test]
    fn test_inbound_protocol_errors() {
        assert_eq!(
            InboundMessage::from_value(&json!({ "name": "shift" })),
            Err(ProtocolError::UnknownMessage("shift".to_string()))
        );
        assert_eq!(
            InboundMessage::from_value(&json!({ "count": 1 })),
            Err(ProtocolError::MissingName)
        );
        assert_eq!(
            InboundMessage::from_value(&json!("overlay-clicked")),
            Err(ProtocolError::MissingName)
        );
    }
}
