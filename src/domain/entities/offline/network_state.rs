use serde::{Deserialize, Serialize};

/// Process-wide connectivity view. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub is_online: bool,
    pub is_reconnecting: bool,
    pub connection_type: Option<String>,
    /// Count of offline to online transitions since start-up.
    pub reconnects: u64,
}

impl NetworkState {
    pub fn initial(is_online: bool, connection_type: Option<String>) -> Self {
        Self {
            is_online,
            is_reconnecting: false,
            connection_type,
            reconnects: 0,
        }
    }

    /// Applies a connectivity reading, counting a reconnect on false to true.
    pub fn apply_online(&mut self, online: bool) {
        if online && !self.is_online {
            self.reconnects += 1;
        }
        self.is_online = online;
        self.is_reconnecting = false;
    }
}
