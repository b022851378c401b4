use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Key-value store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Location marker that opens a purely in-memory database.
pub const MEMORY_LOCATION: &str = ":memory:";

/// Embedded store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file path, or `":memory:"` for a process-local store.
    #[serde(default = "d_path")]
    pub path: String,

    /// How aggressively writes are flushed to disk.
    #[serde(default)]
    pub sync_policy: SyncPolicy,

    /// Seconds between background sweeps of expired records.  `0` disables
    /// the sweeper; expired records are still invisible to reads.
    #[serde(default = "d_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: d_path(),
            sync_policy: SyncPolicy::default(),
            sweep_interval_secs: d_sweep_interval(),
        }
    }
}

impl StoreConfig {
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_LOCATION
    }
}

/// Durability level for committed transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    /// Leave flushing to the operating system.
    Never,
    /// Sync at critical moments only (safe with WAL).
    #[default]
    Normal,
    /// Sync on every commit.
    Always,
}

fn d_path() -> String {
    MEMORY_LOCATION.into()
}

fn d_sweep_interval() -> u64 {
    60
}
