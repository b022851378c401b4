//! Reuse of session handles between requests.

use std::sync::Arc;

use parking_lot::Mutex;

use ks_kv::KvDb;

use crate::codec::{SessionCodec, SessionValues};
use crate::context::SessionContext;
use crate::session::Session;

/// Bounded free-list of idle [`Session`] handles.
///
/// Every handle leaving the pool is fully reset (store, codec, context,
/// identifier, TTL and attributes); every handle entering it has its
/// attributes cleared.  A capacity of `0` disables reuse.
pub struct HandlePool {
    capacity: usize,
    idle: Mutex<Vec<Session>>,
}

impl HandlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            idle: Mutex::new(Vec::with_capacity(capacity.min(64))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of handles currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    pub(crate) fn acquire(
        &self,
        db: &Arc<KvDb>,
        codec: &Arc<dyn SessionCodec>,
        ctx: SessionContext,
        id: &str,
        ttl_secs: u64,
        values: SessionValues,
    ) -> Session {
        let pooled = self.idle.lock().pop();
        match pooled {
            Some(mut session) => {
                tracing::debug!(session_id = id, "reusing pooled session handle");
                session.reset(db, codec, ctx, id, ttl_secs, values);
                session
            }
            None => {
                tracing::debug!(session_id = id, "allocating session handle");
                Session::new(db.clone(), codec.clone(), ctx, id.to_owned(), ttl_secs, values)
            }
        }
    }

    /// Hand a finished session back.  Unsaved changes are discarded.
    pub fn release(&self, mut session: Session) {
        session.clear_for_reuse();
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(session);
        }
    }

    pub(crate) fn clear(&self) {
        self.idle.lock().clear();
    }
}
