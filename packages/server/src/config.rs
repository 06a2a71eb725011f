//! Server configuration.

use std::time::Duration;

use crate::domain::{DEFAULT_CHAT_HISTORY_CAPACITY, DEFAULT_MAX_PARTICIPANTS};

/// Default interval of the playback reconciliation loop
pub const DEFAULT_RECONCILE_INTERVAL_MS: u64 = 3000;

/// Runtime settings collected from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// How often playing rooms are checkpointed and rebroadcast
    pub reconcile_interval: Duration,
    /// Capacity used when a room is created without an explicit limit
    pub max_participants: usize,
    /// Number of chat messages kept per room
    pub chat_history_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_millis(DEFAULT_RECONCILE_INTERVAL_MS),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            chat_history_capacity: DEFAULT_CHAT_HISTORY_CAPACITY,
        }
    }
}
