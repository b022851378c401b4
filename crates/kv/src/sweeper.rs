//! Background removal of expired records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::db::KvDb;
use crate::error::KvError;

/// Spawn a task that calls [`KvDb::purge_expired`] every `interval`.
///
/// The task stops when `shutdown` is cancelled or the database is closed.
/// Sweep failures are logged and the loop keeps going.
pub fn spawn_sweeper(
    db: Arc<KvDb>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    // tokio panics on a zero period.
    let interval = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("expiry sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let db = db.clone();
            match tokio::task::spawn_blocking(move || db.purge_expired()).await {
                Ok(Ok(removed)) => {
                    tracing::debug!(removed, "expiry sweep finished");
                }
                Ok(Err(KvError::Closed)) => {
                    tracing::debug!("store closed, expiry sweeper exiting");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "expiry sweep failed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "expiry sweep task panicked");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::SetOptions;

    #[tokio::test]
    async fn sweeps_expired_records() {
        let db = Arc::new(KvDb::open_in_memory().unwrap());
        db.update(|tx| {
            tx.set("gone", "1", Some(SetOptions::expire_in(Duration::from_millis(5))))?;
            tx.set("kept", "2", None)
        })
        .unwrap();

        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(db.clone(), Duration::from_millis(20), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(120)).await;
        // Already swept by the background task.
        assert_eq!(db.purge_expired().unwrap(), 0);
        assert_eq!(db.view(|tx| tx.get("kept")).unwrap(), "2");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stops_when_store_closes() {
        let db = Arc::new(KvDb::open_in_memory().unwrap());
        let handle = spawn_sweeper(db.clone(), Duration::from_millis(10), CancellationToken::new());

        db.close().unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper should exit after close")
            .unwrap();
    }
}
