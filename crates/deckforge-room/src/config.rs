//! Room-level configuration.

use serde::{Deserialize, Serialize};

/// Settings the room actor itself enforces. Everything rule-shaped
/// (minimum players to start, grace windows, round counts) belongs to the
/// game's own `Config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Hard cap on concurrent members. The game may refuse joins earlier;
    /// the manager uses this for listings and matchmaking.
    pub max_players: usize,

    /// Command channel capacity — backpressure for senders.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_players: 8, channel_size: 64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.max_players, 8);
        assert_eq!(config.channel_size, 64);
    }
}
