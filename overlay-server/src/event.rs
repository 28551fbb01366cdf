use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of events a chat provider can emit and the bus relays.
/// Overlay clients must ignore names they do not recognize, so new kinds can
/// be added here without breaking deployed overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Comment,
    Gift,
    Emotion,
    Notification,
    OperatorComment,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Comment,
        EventKind::Gift,
        EventKind::Emotion,
        EventKind::Notification,
        EventKind::OperatorComment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Comment => "comment",
            EventKind::Gift => "gift",
            EventKind::Emotion => "emotion",
            EventKind::Notification => "notification",
            EventKind::OperatorComment => "operatorComment",
        }
    }
}

/// One relayed event. Immutable once created; evicted from history in FIFO
/// order.
#[derive(Debug, Clone)]
pub struct BroadcastEvent {
    pub kind: EventKind,
    pub payload: Value,
}

impl BroadcastEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// Wire message `{event, data}`. History replay spreads `isHistory: true`
    /// into the payload.
    pub fn to_message(&self, is_history: bool) -> String {
        let mut data = self.payload.clone();
        if is_history {
            if let Some(object) = data.as_object_mut() {
                object.insert("isHistory".to_string(), Value::Bool(true));
            }
        }
        serde_json::json!({ "event": self.kind.as_str(), "data": data }).to_string()
    }
}

/// The sentinel telling overlays to wipe their local state.
pub fn clear_message() -> String {
    serde_json::json!({ "event": "clear", "data": {} }).to_string()
}

/// Upstream connection lifecycle as observed by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}
