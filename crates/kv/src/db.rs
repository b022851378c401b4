use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, TransactionBehavior};

use ks_domain::config::{StoreConfig, SyncPolicy, MEMORY_LOCATION};
use ks_domain::trace::TraceEvent;

use crate::error::{KvError, KvResult};
use crate::tx::{ReadTx, WriteTx};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,
    expires_at INTEGER
) WITHOUT ROWID;
CREATE INDEX IF NOT EXISTS kv_expires_at ON kv (expires_at) WHERE expires_at IS NOT NULL;
";

/// Open-time settings.
#[derive(Debug, Clone)]
pub struct KvOptions {
    pub sync_policy: SyncPolicy,
    /// How long a writer waits on a file lock held by another process.
    pub busy_timeout: Duration,
}

impl Default for KvOptions {
    fn default() -> Self {
        Self {
            sync_policy: SyncPolicy::Normal,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&StoreConfig> for KvOptions {
    fn from(cfg: &StoreConfig) -> Self {
        Self {
            sync_policy: cfg.sync_policy,
            ..Self::default()
        }
    }
}

/// Handle to an open key-value database.
///
/// The connection sits behind a mutex, so transactions from different
/// threads run one after another.  After [`KvDb::close`] every transaction
/// fails with [`KvError::Closed`].
pub struct KvDb {
    location: String,
    conn: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for KvDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvDb")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl KvDb {
    /// Open a database file, or an in-memory database for `":memory:"`.
    pub fn open(location: impl AsRef<Path>) -> KvResult<Self> {
        Self::open_with(location, KvOptions::default())
    }

    pub fn open_in_memory() -> KvResult<Self> {
        Self::open_with(MEMORY_LOCATION, KvOptions::default())
    }

    pub fn open_with(location: impl AsRef<Path>, opts: KvOptions) -> KvResult<Self> {
        let location = location.as_ref();
        let in_memory = location == Path::new(MEMORY_LOCATION);

        let conn = if in_memory {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = location.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let conn = Connection::open(location)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            conn
        };

        conn.busy_timeout(opts.busy_timeout)?;
        let synchronous = match opts.sync_policy {
            SyncPolicy::Never => "OFF",
            SyncPolicy::Normal => "NORMAL",
            SyncPolicy::Always => "FULL",
        };
        conn.execute_batch(&format!("PRAGMA synchronous = {synchronous};"))?;
        conn.execute_batch(SCHEMA)?;

        let location = location.display().to_string();
        TraceEvent::StoreOpened {
            location: location.clone(),
        }
        .emit();

        Ok(Self {
            location,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// The path (or `":memory:"`) this database was opened with.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }

    /// Run `f` inside a read-only transaction.
    pub fn view<T>(&self, f: impl FnOnce(&ReadTx<'_>) -> KvResult<T>) -> KvResult<T> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(KvError::Closed)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&ReadTx::new(&tx, now_ms()))?;
        tx.rollback()?;
        Ok(out)
    }

    /// Run `f` inside a read-write transaction.  The transaction commits
    /// when `f` returns `Ok` and rolls back otherwise.
    pub fn update<T>(&self, f: impl FnOnce(&WriteTx<'_>) -> KvResult<T>) -> KvResult<T> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(KvError::Closed)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&WriteTx::new(&tx, now_ms()))?;
        tx.commit()?;
        Ok(out)
    }

    /// Physically remove every expired record.  Returns how many were removed.
    pub fn purge_expired(&self) -> KvResult<usize> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(KvError::Closed)?;
        let removed = conn.execute(
            "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now_ms()],
        )?;
        if removed > 0 {
            TraceEvent::ExpiredPurged { removed }.emit();
        }
        Ok(removed)
    }

    /// Close the underlying connection.  Calling this more than once is a
    /// no-op.
    pub fn close(&self) -> KvResult<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| KvError::Sqlite(e))?;
        TraceEvent::StoreClosed.emit();
        Ok(())
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::SetOptions;

    fn mem() -> KvDb {
        KvDb::open_in_memory().unwrap()
    }

    #[test]
    fn missing_key_is_not_found() {
        let db = mem();
        let err = db.view(|tx| tx.get("nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn set_then_get() {
        let db = mem();
        db.update(|tx| tx.set("k", "v", None)).unwrap();
        assert_eq!(db.view(|tx| tx.get("k")).unwrap(), "v");
        assert_eq!(db.view(|tx| tx.ttl("k")).unwrap(), None);
    }

    #[test]
    fn empty_value_is_found() {
        let db = mem();
        db.update(|tx| tx.set("k", "", None)).unwrap();
        assert_eq!(db.view(|tx| tx.get("k")).unwrap(), "");
    }

    #[test]
    fn expired_key_is_invisible() {
        let db = mem();
        db.update(|tx| tx.set("k", "v", Some(SetOptions::expire_in(Duration::from_millis(20)))))
            .unwrap();
        assert_eq!(db.view(|tx| tx.get("k")).unwrap(), "v");

        std::thread::sleep(Duration::from_millis(50));
        assert!(db.view(|tx| tx.get("k")).unwrap_err().is_not_found());
        assert!(db.view(|tx| tx.ttl("k")).unwrap_err().is_not_found());
    }

    #[test]
    fn ttl_reports_remaining_lifetime() {
        let db = mem();
        db.update(|tx| tx.set("k", "v", Some(SetOptions::expire_in(Duration::from_secs(60)))))
            .unwrap();
        let ttl = db.view(|tx| tx.ttl("k")).unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(60));
        assert!(ttl > Duration::from_secs(55));
    }

    #[test]
    fn set_without_options_clears_expiry() {
        let db = mem();
        db.update(|tx| tx.set("k", "v", Some(SetOptions::expire_in(Duration::from_secs(60)))))
            .unwrap();
        db.update(|tx| tx.set("k", "v2", None)).unwrap();
        assert_eq!(db.view(|tx| tx.ttl("k")).unwrap(), None);
        assert_eq!(db.view(|tx| tx.get("k")).unwrap(), "v2");
    }

    #[test]
    fn failed_update_rolls_back() {
        let db = mem();
        let res: KvResult<()> = db.update(|tx| {
            tx.set("a", "1", None)?;
            tx.delete("missing")?;
            Ok(())
        });
        assert!(res.unwrap_err().is_not_found());
        assert!(db.view(|tx| tx.get("a")).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_returns_previous_value() {
        let db = mem();
        db.update(|tx| tx.set("k", "old", None)).unwrap();
        assert_eq!(db.update(|tx| tx.delete("k")).unwrap(), "old");
        assert!(db.update(|tx| tx.delete("k")).unwrap_err().is_not_found());
    }

    #[test]
    fn purge_removes_only_expired() {
        let db = mem();
        db.update(|tx| {
            tx.set("short", "1", Some(SetOptions::expire_in(Duration::from_millis(10))))?;
            tx.set("long", "2", Some(SetOptions::expire_in(Duration::from_secs(60))))?;
            tx.set("forever", "3", None)
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(db.purge_expired().unwrap(), 1);
        assert_eq!(db.purge_expired().unwrap(), 0);
        assert_eq!(db.view(|tx| tx.get("long")).unwrap(), "2");
        assert_eq!(db.view(|tx| tx.get("forever")).unwrap(), "3");
    }

    #[test]
    fn close_is_idempotent() {
        let db = mem();
        db.close().unwrap();
        db.close().unwrap();
        assert!(db.is_closed());
        assert!(matches!(db.view(|tx| tx.get("k")), Err(KvError::Closed)));
        assert!(matches!(db.update(|tx| tx.set("k", "v", None)), Err(KvError::Closed)));
        assert!(matches!(db.purge_expired(), Err(KvError::Closed)));
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.db");

        let db = KvDb::open(&path).unwrap();
        db.update(|tx| tx.set("k", "persisted", None)).unwrap();
        db.close().unwrap();

        let db = KvDb::open_with(
            &path,
            KvOptions {
                sync_policy: SyncPolicy::Always,
                ..KvOptions::default()
            },
        )
        .unwrap();
        assert_eq!(db.view(|tx| tx.get("k")).unwrap(), "persisted");
        assert_eq!(db.location(), path.display().to_string());
    }
}
