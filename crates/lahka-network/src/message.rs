use serde::{Deserialize, Serialize};

/// Wire format for every gossip frame: a type tag plus an arbitrary JSON
/// payload (SPEC_FULL.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
}

impl GossipMessage {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        GossipMessage {
            kind: kind.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let msg = GossipMessage::new("tx", serde_json::json!({"hash": "abc"}));
        let text = serde_json::to_string(&msg).unwrap();
        assert!(text.contains("\"type\":\"tx\""));
        let back: GossipMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(back.kind, "tx");
    }
}
