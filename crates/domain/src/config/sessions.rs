use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session handle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// TTL applied when the caller does not pass one explicitly (the CLI
    /// `touch`/`rotate` commands use it).
    #[serde(default = "d_ttl")]
    pub default_ttl_secs: u64,

    /// Maximum number of idle handles kept for reuse.  `0` disables pooling.
    #[serde(default = "d_pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: d_ttl(),
            pool_capacity: d_pool_capacity(),
        }
    }
}

fn d_ttl() -> u64 {
    7200
}

fn d_pool_capacity() -> usize {
    64
}
