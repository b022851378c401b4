//! Server-side session storage on an embedded key-value store.
//!
//! [`SessionRegistry`] maps session lifecycle operations (check, create,
//! update, delete, rotate) onto store transactions and hands out
//! [`Session`] handles.  A handle keeps the session's attributes in memory
//! behind a read/write lock; [`Session::save`] is the only point where they
//! reach the store, written with a fresh TTL.

pub mod codec;
pub mod context;
pub mod contract;
pub mod pool;
pub mod registry;
pub mod session;

pub use codec::{JsonCodec, SessionCodec, SessionValues};
pub use context::SessionContext;
pub use contract::{SessionManagerStore, SessionStore};
pub use pool::HandlePool;
pub use registry::SessionRegistry;
pub use session::Session;
