//! Per-session handle: an in-memory attribute map plus the means to persist it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use ks_domain::error::Result;
use ks_domain::trace::TraceEvent;
use ks_kv::{KvDb, SetOptions};

use crate::codec::{encode_record, SessionCodec, SessionValues};
use crate::context::SessionContext;

/// Expiry applied to a record written for a session with `ttl_secs`.
pub(crate) fn expiry(ttl_secs: u64) -> SetOptions {
    SetOptions::expire_in(Duration::from_secs(ttl_secs))
}

/// Live view of one session.
///
/// `set`/`get`/`delete` only touch the in-memory map; nothing reaches the
/// store until [`Session::save`] or [`Session::flush`].  Dropping a handle
/// discards unsaved changes.
pub struct Session {
    db: Arc<KvDb>,
    codec: Arc<dyn SessionCodec>,
    ctx: SessionContext,
    id: String,
    ttl_secs: u64,
    values: RwLock<SessionValues>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("ttl_secs", &self.ttl_secs)
            .field("keys", &self.values.read().len())
            .finish()
    }
}

impl Session {
    pub(crate) fn new(
        db: Arc<KvDb>,
        codec: Arc<dyn SessionCodec>,
        ctx: SessionContext,
        id: String,
        ttl_secs: u64,
        values: SessionValues,
    ) -> Self {
        Self {
            db,
            codec,
            ctx,
            id,
            ttl_secs,
            values: RwLock::new(values),
        }
    }

    /// Overwrite every field so a pooled handle carries nothing over from
    /// the session it served before.
    pub(crate) fn reset(
        &mut self,
        db: &Arc<KvDb>,
        codec: &Arc<dyn SessionCodec>,
        ctx: SessionContext,
        id: &str,
        ttl_secs: u64,
        values: SessionValues,
    ) {
        self.db = db.clone();
        self.codec = codec.clone();
        self.ctx = ctx;
        self.id.clear();
        self.id.push_str(id);
        self.ttl_secs = ttl_secs;
        *self.values.get_mut() = values;
    }

    /// Drop attributes before the handle goes idle in the pool.
    pub(crate) fn clear_for_reuse(&mut self) {
        self.values.get_mut().clear();
    }

    pub fn session_id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Lifetime, in seconds from the moment of each save.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Remove `key`, returning its value.  Presence is checked under the
    /// read lock and the write lock is only taken when there is something to
    /// remove; the pair is not atomic.
    pub fn delete(&self, key: &str) -> Option<Value> {
        let present = self.values.read().contains_key(key);
        if !present {
            return None;
        }
        self.values.write().remove(key)
    }

    /// Deserialize the value under `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Serialize `value` and store it under `key`.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: impl Into<String>, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// Copy of the current attribute map.
    pub fn snapshot(&self) -> SessionValues {
        self.values.read().clone()
    }

    /// Remove every attribute and persist the now-empty session.
    pub fn flush(&self) -> Result<()> {
        self.values.write().clear();
        self.save()?;
        TraceEvent::SessionFlushed {
            session_id: self.id.clone(),
        }
        .emit();
        Ok(())
    }

    /// Encode the map and write it under [`Session::session_id`] with a
    /// fresh TTL, replacing whatever is stored there.
    pub fn save(&self) -> Result<()> {
        let (value, keys) = {
            let values = self.values.read();
            (encode_record(self.codec.as_ref(), &values)?, values.len())
        };

        self.ctx.ensure_active()?;
        self.db
            .update(|tx| tx.set(&self.id, &value, Some(expiry(self.ttl_secs))))?;

        TraceEvent::SessionSaved {
            session_id: self.id.clone(),
            keys,
            bytes: value.len(),
        }
        .emit();
        Ok(())
    }
}
