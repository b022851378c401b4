//! Capability traits a host session framework programs against.
//!
//! [`SessionRegistry`] and [`Session`] implement them by delegating to their
//! inherent methods.

use serde_json::Value;

use ks_domain::error::Result;

use crate::context::SessionContext;
use crate::registry::SessionRegistry;
use crate::session::Session;

/// One session's mutable view.
pub trait SessionStore: Send + Sync {
    fn context(&self) -> &SessionContext;
    fn session_id(&self) -> &str;
    fn set(&self, key: &str, value: Value);
    fn get(&self, key: &str) -> Option<Value>;
    fn delete(&self, key: &str) -> Option<Value>;
    fn flush(&self) -> Result<()>;
    fn save(&self) -> Result<()>;
}

/// Manager-level store: existence checks and handle construction.
pub trait SessionManagerStore: Send + Sync {
    type Session: SessionStore;

    fn check(&self, ctx: &SessionContext, sid: &str) -> Result<bool>;
    fn create(&self, ctx: SessionContext, sid: &str, ttl_secs: u64) -> Result<Self::Session>;
    fn update(&self, ctx: SessionContext, sid: &str, ttl_secs: u64) -> Result<Self::Session>;
    fn delete(&self, ctx: &SessionContext, sid: &str) -> Result<()>;
    fn refresh(
        &self,
        ctx: SessionContext,
        old_sid: &str,
        sid: &str,
        ttl_secs: u64,
    ) -> Result<Self::Session>;
    fn close(&self) -> Result<()>;
}

impl SessionStore for Session {
    fn context(&self) -> &SessionContext {
        Session::context(self)
    }

    fn session_id(&self) -> &str {
        Session::session_id(self)
    }

    fn set(&self, key: &str, value: Value) {
        Session::set(self, key, value);
    }

    fn get(&self, key: &str) -> Option<Value> {
        Session::get(self, key)
    }

    fn delete(&self, key: &str) -> Option<Value> {
        Session::delete(self, key)
    }

    fn flush(&self) -> Result<()> {
        Session::flush(self)
    }

    fn save(&self) -> Result<()> {
        Session::save(self)
    }
}

impl SessionManagerStore for SessionRegistry {
    type Session = Session;

    fn check(&self, ctx: &SessionContext, sid: &str) -> Result<bool> {
        self.exists(ctx, sid)
    }

    fn create(&self, ctx: SessionContext, sid: &str, ttl_secs: u64) -> Result<Session> {
        Ok(SessionRegistry::create(self, ctx, sid, ttl_secs))
    }

    fn update(&self, ctx: SessionContext, sid: &str, ttl_secs: u64) -> Result<Session> {
        SessionRegistry::update(self, ctx, sid, ttl_secs)
    }

    fn delete(&self, ctx: &SessionContext, sid: &str) -> Result<()> {
        SessionRegistry::delete(self, ctx, sid)
    }

    fn refresh(
        &self,
        ctx: SessionContext,
        old_sid: &str,
        sid: &str,
        ttl_secs: u64,
    ) -> Result<Session> {
        SessionRegistry::refresh(self, ctx, old_sid, sid, ttl_secs)
    }

    fn close(&self) -> Result<()> {
        SessionRegistry::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Exercise the registry purely through the traits, the way a framework
    /// would.
    fn round_trip<M: SessionManagerStore>(manager: &M) {
        let ctx = SessionContext::new();
        let s = manager.create(ctx.clone(), "sid", 60).unwrap();
        SessionStore::set(&s, "user", json!("ada"));
        SessionStore::save(&s).unwrap();
        assert!(manager.check(&ctx, "sid").unwrap());

        let s = manager.refresh(ctx.clone(), "sid", "sid2", 60).unwrap();
        assert_eq!(SessionStore::session_id(&s), "sid2");
        assert_eq!(SessionStore::get(&s, "user"), Some(json!("ada")));
        assert_eq!(SessionStore::delete(&s, "user"), Some(json!("ada")));
        SessionStore::flush(&s).unwrap();

        manager.delete(&ctx, "sid2").unwrap();
        assert!(!manager.check(&ctx, "sid2").unwrap());
        manager.close().unwrap();
    }

    #[test]
    fn registry_satisfies_contract() {
        round_trip(&SessionRegistry::memory().unwrap());
    }
}
