//! One-shot operations against single session records.

use std::collections::BTreeMap;

use anyhow::Context;

use ks_sessions::{SessionContext, SessionRegistry};

fn ctx() -> SessionContext {
    SessionContext::new().with_request_id("cli")
}

pub fn check(registry: &SessionRegistry, id: &str) -> anyhow::Result<bool> {
    registry
        .exists(&ctx(), id)
        .with_context(|| format!("checking session {id}"))
}

/// Pretty JSON of the stored attributes (keys sorted), or `None` when the
/// record is absent.
pub fn show(registry: &SessionRegistry, id: &str) -> anyhow::Result<Option<String>> {
    let Some(values) = registry
        .read(&ctx(), id)
        .with_context(|| format!("reading session {id}"))?
    else {
        return Ok(None);
    };
    let sorted: BTreeMap<_, _> = values.into_iter().collect();
    Ok(Some(serde_json::to_string_pretty(&sorted)?))
}

/// Refresh a session's expiry.  Returns how many attributes it holds.
pub fn touch(registry: &SessionRegistry, id: &str, ttl_secs: u64) -> anyhow::Result<usize> {
    let session = registry
        .update(ctx(), id, ttl_secs)
        .with_context(|| format!("touching session {id}"))?;
    let count = session.len();
    registry.release(session);
    Ok(count)
}

/// Move a session to `new_id`.  Returns how many attributes were carried.
pub fn rotate(
    registry: &SessionRegistry,
    old_id: &str,
    new_id: &str,
    ttl_secs: u64,
) -> anyhow::Result<usize> {
    let session = registry
        .refresh(ctx(), old_id, new_id, ttl_secs)
        .with_context(|| format!("rotating session {old_id} -> {new_id}"))?;
    let count = session.len();
    registry.release(session);
    Ok(count)
}

pub fn delete(registry: &SessionRegistry, id: &str) -> anyhow::Result<()> {
    registry
        .delete(&ctx(), id)
        .with_context(|| format!("deleting session {id}"))
}

pub fn purge(registry: &SessionRegistry) -> anyhow::Result<usize> {
    registry
        .db()
        .purge_expired()
        .context("purging expired sessions")
}
