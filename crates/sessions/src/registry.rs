//! Session registry: maps session lifecycle operations onto store
//! transactions and hands out [`Session`] handles.
//!
//! Every store access is a single transaction.  `update` and `refresh` read
//! in one transaction and write in another, so a concurrent writer on the
//! same identifier can slip in between; the last write wins.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ks_domain::config::{SessionsConfig, StoreConfig};
use ks_domain::error::Result;
use ks_domain::trace::TraceEvent;
use ks_kv::{KvDb, KvError, KvOptions};

use crate::codec::{decode_record, JsonCodec, SessionCodec, SessionValues};
use crate::context::SessionContext;
use crate::pool::HandlePool;
use crate::session::{expiry, Session};

const DEFAULT_POOL_CAPACITY: usize = 64;

/// Manager-level session store backed by a [`KvDb`].
pub struct SessionRegistry {
    db: Arc<KvDb>,
    codec: Arc<dyn SessionCodec>,
    pool: HandlePool,
}

impl SessionRegistry {
    /// Wrap an already-open database, using [`JsonCodec`].
    pub fn new(db: Arc<KvDb>) -> Self {
        Self {
            db,
            codec: Arc::new(JsonCodec),
            pool: HandlePool::new(DEFAULT_POOL_CAPACITY),
        }
    }

    /// Registry over a private in-memory database.
    pub fn memory() -> Result<Self> {
        Ok(Self::new(Arc::new(KvDb::open_in_memory()?)))
    }

    /// Registry over a database file, created if missing.
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Arc::new(KvDb::open(path)?)))
    }

    /// Build from configuration.
    pub fn open(store: &StoreConfig, sessions: &SessionsConfig) -> Result<Self> {
        let db = KvDb::open_with(&store.path, KvOptions::from(store))?;
        Ok(Self::new(Arc::new(db)).with_pool_capacity(sessions.pool_capacity))
    }

    pub fn with_codec(mut self, codec: Arc<dyn SessionCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool = HandlePool::new(capacity);
        self
    }

    pub fn db(&self) -> &Arc<KvDb> {
        &self.db
    }

    pub fn pool(&self) -> &HandlePool {
        &self.pool
    }

    /// Start the background sweeper for expired records.
    pub fn spawn_sweeper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        ks_kv::spawn_sweeper(self.db.clone(), interval, shutdown)
    }

    /// Start the sweeper at `store.sweep_interval_secs`.  `None` when the
    /// interval is `0`.
    pub fn spawn_configured_sweeper(
        &self,
        store: &StoreConfig,
        shutdown: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        if store.sweep_interval_secs == 0 {
            tracing::debug!("expiry sweeper disabled by configuration");
            return None;
        }
        let interval = Duration::from_secs(store.sweep_interval_secs);
        tracing::debug!(interval_secs = store.sweep_interval_secs, "starting expiry sweeper");
        Some(self.spawn_sweeper(interval, shutdown))
    }

    // ── Store access ─────────────────────────────────────────────────

    /// Raw stored value for `id`, `None` when missing or expired.
    fn load(&self, ctx: &SessionContext, id: &str) -> Result<Option<String>> {
        ctx.ensure_active()?;
        match self.db.view(|tx| tx.get(id)) {
            Ok(raw) => Ok(Some(raw)),
            Err(KvError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn handle(&self, ctx: SessionContext, id: &str, ttl_secs: u64, values: SessionValues) -> Session {
        self.pool.acquire(&self.db, &self.codec, ctx, id, ttl_secs, values)
    }

    // ── Lifecycle operations ─────────────────────────────────────────

    /// Whether a record exists for `id`.  A record holding an empty
    /// session counts as existing.
    pub fn exists(&self, ctx: &SessionContext, id: &str) -> Result<bool> {
        Ok(self.load(ctx, id)?.is_some())
    }

    /// Decoded attributes stored for `id` without touching its TTL.
    pub fn read(&self, ctx: &SessionContext, id: &str) -> Result<Option<SessionValues>> {
        self.load(ctx, id)?
            .map(|raw| decode_record(self.codec.as_ref(), &raw))
            .transpose()
    }

    /// Fresh, empty handle.  Nothing is written until the handle is saved.
    pub fn create(&self, ctx: SessionContext, id: &str, ttl_secs: u64) -> Session {
        TraceEvent::SessionCreated {
            session_id: id.to_owned(),
            ttl_secs,
        }
        .emit();
        self.handle(ctx, id, ttl_secs, SessionValues::new())
    }

    /// Load the session stored under `id` and push its expiry out to
    /// `ttl_secs` from now.
    ///
    /// A missing, expired or empty record yields a fresh empty handle (the
    /// same as [`SessionRegistry::create`]); no record is written in that
    /// case.  The payload is decoded before anything is written, so a
    /// corrupt record is left untouched.
    pub fn update(&self, ctx: SessionContext, id: &str, ttl_secs: u64) -> Result<Session> {
        let raw = match self.load(&ctx, id)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                TraceEvent::SessionUpdated {
                    session_id: id.to_owned(),
                    found: false,
                    ttl_secs,
                }
                .emit();
                return Ok(self.handle(ctx, id, ttl_secs, SessionValues::new()));
            }
        };

        let values = decode_record(self.codec.as_ref(), &raw)?;
        tracing::debug!(session_id = id, keys = values.len(), "session decoded for touch");

        ctx.ensure_active()?;
        self.db.update(|tx| tx.set(id, &raw, Some(expiry(ttl_secs))))?;

        TraceEvent::SessionUpdated {
            session_id: id.to_owned(),
            found: true,
            ttl_secs,
        }
        .emit();
        Ok(self.handle(ctx, id, ttl_secs, values))
    }

    /// Remove the record for `id`.  Removing a missing record succeeds.
    pub fn delete(&self, ctx: &SessionContext, id: &str) -> Result<()> {
        ctx.ensure_active()?;
        let existed = self.db.update(|tx| match tx.delete(id) {
            Ok(_) => Ok(true),
            Err(KvError::NotFound) => Ok(false),
            Err(e) => Err(e),
        })?;

        TraceEvent::SessionDeleted {
            session_id: id.to_owned(),
            existed,
        }
        .emit();
        Ok(())
    }

    /// Move the session stored under `old_id` to `new_id` with a fresh TTL.
    ///
    /// The write of `new_id` and the removal of `old_id` share one
    /// transaction.  A missing, expired or empty `old_id` yields a fresh
    /// empty handle bound to `new_id` and leaves the store untouched.
    pub fn refresh(
        &self,
        ctx: SessionContext,
        old_id: &str,
        new_id: &str,
        ttl_secs: u64,
    ) -> Result<Session> {
        let raw = match self.load(&ctx, old_id)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                TraceEvent::SessionRotated {
                    old_session_id: old_id.to_owned(),
                    new_session_id: new_id.to_owned(),
                    found: false,
                }
                .emit();
                return Ok(self.handle(ctx, new_id, ttl_secs, SessionValues::new()));
            }
        };

        let values = decode_record(self.codec.as_ref(), &raw)?;
        tracing::debug!(
            old_session_id = old_id,
            new_session_id = new_id,
            keys = values.len(),
            "session decoded for rotation"
        );

        ctx.ensure_active()?;
        self.db.update(|tx| {
            tx.set(new_id, &raw, Some(expiry(ttl_secs)))?;
            if old_id == new_id {
                return Ok(());
            }
            // The old record may have expired since it was read.
            match tx.delete(old_id) {
                Ok(_) | Err(KvError::NotFound) => Ok(()),
                Err(e) => Err(e),
            }
        })?;

        TraceEvent::SessionRotated {
            old_session_id: old_id.to_owned(),
            new_session_id: new_id.to_owned(),
            found: true,
        }
        .emit();
        Ok(self.handle(ctx, new_id, ttl_secs, values))
    }

    /// Return a finished handle for reuse.
    pub fn release(&self, session: Session) {
        self.pool.release(session);
    }

    /// Close the underlying store.  Safe to call more than once; every later
    /// store operation fails.
    pub fn close(&self) -> Result<()> {
        self.pool.clear();
        self.db.close()?;
        Ok(())
    }
}
