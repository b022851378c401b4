//! Embedded, ordered key-value store with per-key expiration.
//!
//! A single SQLite table holds `key → value` pairs with an optional absolute
//! expiry.  All access happens inside closures passed to [`KvDb::view`]
//! (read-only) or [`KvDb::update`] (read-write); an `update` closure that
//! returns an error rolls the whole transaction back.  Expired keys are
//! invisible to reads and are physically removed by [`KvDb::purge_expired`]
//! or the background [`spawn_sweeper`] task.

pub mod db;
pub mod error;
pub mod sweeper;
pub mod tx;

pub use db::{KvDb, KvOptions};
pub use error::{KvError, KvResult};
pub use ks_domain::config::{SyncPolicy, MEMORY_LOCATION};
pub use sweeper::spawn_sweeper;
pub use tx::{ReadTx, SetOptions, WriteTx};
