//! Transaction views handed to [`KvDb::view`](crate::KvDb::view) and
//! [`KvDb::update`](crate::KvDb::update) closures.

use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{KvError, KvResult};

/// Expiration settings for [`WriteTx::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub expires: bool,
    pub ttl: Duration,
}

impl SetOptions {
    /// Expire the key `ttl` after the transaction's start time.
    pub fn expire_in(ttl: Duration) -> Self {
        Self { expires: true, ttl }
    }
}

/// Read-only transaction.
pub struct ReadTx<'a> {
    conn: &'a Connection,
    now_ms: i64,
}

impl<'a> ReadTx<'a> {
    pub(crate) fn new(conn: &'a Connection, now_ms: i64) -> Self {
        Self { conn, now_ms }
    }

    /// Value stored under `key`.  Missing and expired keys yield
    /// [`KvError::NotFound`].
    pub fn get(&self, key: &str) -> KvResult<String> {
        get_live(self.conn, key, self.now_ms)
    }

    /// Remaining lifetime of `key`; `None` when the key never expires.
    pub fn ttl(&self, key: &str) -> KvResult<Option<Duration>> {
        ttl_live(self.conn, key, self.now_ms)
    }
}

/// Read-write transaction.
pub struct WriteTx<'a> {
    conn: &'a Connection,
    now_ms: i64,
}

impl<'a> WriteTx<'a> {
    pub(crate) fn new(conn: &'a Connection, now_ms: i64) -> Self {
        Self { conn, now_ms }
    }

    pub fn get(&self, key: &str) -> KvResult<String> {
        get_live(self.conn, key, self.now_ms)
    }

    pub fn ttl(&self, key: &str) -> KvResult<Option<Duration>> {
        ttl_live(self.conn, key, self.now_ms)
    }

    /// Insert or replace `key`.  Without options (or with `expires = false`)
    /// the key never expires; replacing a key always resets its expiry.
    pub fn set(&self, key: &str, value: &str, opts: Option<SetOptions>) -> KvResult<()> {
        let expires_at = match opts {
            Some(o) if o.expires => Some(self.now_ms.saturating_add(duration_ms(o.ttl))),
            _ => None,
        };
        self.conn.execute(
            "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    /// Remove `key` and return its previous value.  Deleting a missing or
    /// expired key yields [`KvError::NotFound`] (an expired row is still
    /// dropped from disk).
    pub fn delete(&self, key: &str) -> KvResult<String> {
        let prev = get_live(self.conn, key, self.now_ms);
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        prev
    }
}

fn get_live(conn: &Connection, key: &str, now_ms: i64) -> KvResult<String> {
    conn.query_row(
        "SELECT value FROM kv WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
        params![key, now_ms],
        |row| row.get::<_, String>(0),
    )
    .optional()?
    .ok_or(KvError::NotFound)
}

fn ttl_live(conn: &Connection, key: &str, now_ms: i64) -> KvResult<Option<Duration>> {
    let expires_at = conn
        .query_row(
            "SELECT expires_at FROM kv WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
            params![key, now_ms],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()?
        .ok_or(KvError::NotFound)?;

    Ok(expires_at.map(|at| Duration::from_millis(at.saturating_sub(now_ms).max(0) as u64)))
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
