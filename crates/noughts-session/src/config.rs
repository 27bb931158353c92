//! Session manager configuration.

use serde::{Deserialize, Serialize};

/// Tuning for the [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capacity of each game actor's command channel. A full channel
    /// makes callers wait rather than drop the command.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
        }
    }
}
