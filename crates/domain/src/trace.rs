use serde::Serialize;

/// Structured trace events emitted across all kvsession crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    StoreOpened {
        location: String,
    },
    StoreClosed,
    SessionCreated {
        session_id: String,
        ttl_secs: u64,
    },
    SessionUpdated {
        session_id: String,
        found: bool,
        ttl_secs: u64,
    },
    SessionRotated {
        old_session_id: String,
        new_session_id: String,
        found: bool,
    },
    SessionDeleted {
        session_id: String,
        existed: bool,
    },
    SessionSaved {
        session_id: String,
        keys: usize,
        bytes: usize,
    },
    SessionFlushed {
        session_id: String,
    },
    ExpiredPurged {
        removed: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ks_event");
    }
}
