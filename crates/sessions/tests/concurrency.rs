use std::sync::Arc;

use ks_sessions::{SessionContext, SessionRegistry};

#[test]
fn concurrent_sets_on_distinct_keys_are_all_kept() {
    let reg = SessionRegistry::memory().unwrap();
    let session = Arc::new(reg.create(SessionContext::new(), "busy", 60));

    const THREADS: usize = 16;
    const PER_THREAD: usize = 250;

    std::thread::scope(|s| {
        for t in 0..THREADS {
            let session = session.clone();
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    session.set(format!("t{t}-k{i}"), i);
                    // Interleave reads to contend on the lock.
                    let _ = session.get(&format!("t{t}-k{i}"));
                }
            });
        }
    });

    assert_eq!(session.len(), THREADS * PER_THREAD);

    session.save().unwrap();
    let reloaded = reg.update(SessionContext::new(), "busy", 60).unwrap();
    assert_eq!(reloaded.len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_deletes_remove_each_key_once() {
    let reg = SessionRegistry::memory().unwrap();
    let session = Arc::new(reg.create(SessionContext::new(), "del", 60));
    for i in 0..100 {
        session.set(format!("k{i}"), i);
    }

    let removed: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = session.clone();
                s.spawn(move || {
                    (0..100)
                        .filter(|i| session.delete(&format!("k{i}")).is_some())
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(removed, 100);
    assert!(session.is_empty());
}

#[test]
fn parallel_sessions_share_one_registry() {
    let reg = Arc::new(SessionRegistry::memory().unwrap());

    std::thread::scope(|s| {
        for t in 0..8 {
            let reg = reg.clone();
            s.spawn(move || {
                let id = format!("user-{t}");
                let session = reg.create(SessionContext::new(), &id, 60);
                session.set("owner", t);
                session.save().unwrap();

                let rotated = reg
                    .refresh(SessionContext::new(), &id, &format!("{id}-rotated"), 60)
                    .unwrap();
                assert_eq!(rotated.get("owner"), Some(serde_json::json!(t)));
                reg.release(rotated);
            });
        }
    });

    for t in 0..8 {
        let ctx = SessionContext::new();
        assert!(!reg.exists(&ctx, &format!("user-{t}")).unwrap());
        assert!(reg.exists(&ctx, &format!("user-{t}-rotated")).unwrap());
    }
}
