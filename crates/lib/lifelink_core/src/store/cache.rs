//! Shared connection cache.
//!
//! Exactly one live store handle exists per process at steady state. The
//! cache initializes it lazily on the first `acquire()`, so a cold-started
//! process serves its first request and connects on demand. Concurrent
//! first callers serialize on an init guard: one connects, the rest wait
//! and then read the stored handle.
//!
//! A failed initialization leaves the slot empty — the error is returned
//! to the current caller and the next `acquire()` retries. Cancelling a
//! caller mid-connect likewise leaves the slot empty, never half set.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{ResourceStore, StoreConnector, StoreError};

/// Owns the lifecycle of the single shared store handle.
pub struct ConnectionCache {
    connector: Box<dyn StoreConnector>,
    handle: RwLock<Option<Arc<dyn ResourceStore>>>,
    init: Mutex<()>,
}

impl ConnectionCache {
    pub fn new(connector: impl StoreConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            handle: RwLock::new(None),
            init: Mutex::new(()),
        }
    }

    /// Return the shared handle, connecting on first use.
    ///
    /// The fast path is a read-lock lookup with no I/O. On a cold start the
    /// init guard admits a single connect; waiters re-check the slot once
    /// they hold the guard, so at most one underlying connection is ever
    /// established per initialization round.
    pub async fn acquire(&self) -> Result<Arc<dyn ResourceStore>, StoreError> {
        if let Some(handle) = self.handle.read().await.as_ref() {
            return Ok(handle.clone());
        }

        let _guard = self.init.lock().await;
        // A concurrent caller may have finished initializing while this one
        // waited on the guard.
        if let Some(handle) = self.handle.read().await.as_ref() {
            return Ok(handle.clone());
        }

        debug!("initializing resource store handle");
        let handle = self.connector.connect().await?;
        *self.handle.write().await = Some(handle.clone());
        Ok(handle)
    }

    /// Drop the current handle and establish a fresh one.
    ///
    /// Callers holding clones of the old handle keep using it until they
    /// finish; new `acquire()` calls see the replacement.
    pub async fn reconnect(&self) -> Result<Arc<dyn ResourceStore>, StoreError> {
        let _guard = self.init.lock().await;
        debug!("reconnecting resource store handle");
        let handle = self.connector.connect().await?;
        *self.handle.write().await = Some(handle.clone());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::store::memory::MemoryStore;

    /// Counts connection attempts; each successful connect takes `delay` and
    /// yields a fresh `MemoryStore`.
    struct CountingConnector {
        attempts: Arc<AtomicUsize>,
        fail_first: usize,
        delay: Duration,
    }

    impl CountingConnector {
        fn new(delay: Duration) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    attempts: attempts.clone(),
                    fail_first: 0,
                    delay,
                },
                attempts,
            )
        }

        fn failing_first(mut self, n: usize) -> Self {
            self.fail_first = n;
            self
        }
    }

    #[async_trait]
    impl StoreConnector for CountingConnector {
        async fn connect(&self) -> Result<Arc<dyn ResourceStore>, StoreError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if attempt < self.fail_first {
                return Err(StoreError::Connection("store unreachable".into()));
            }
            Ok(Arc::new(MemoryStore::new()))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cold_start_converges_on_one_handle() {
        let (connector, attempts) = CountingConnector::new(Duration::from_millis(20));
        let cache = Arc::new(ConnectionCache::new(connector));

        let tasks: Vec<_> = (0..12)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.acquire().await })
            })
            .collect();

        let handles: Vec<_> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|join| join.expect("task").expect("acquire"))
            .collect();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        for handle in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], handle));
        }
    }

    #[tokio::test]
    async fn acquire_after_init_does_not_reconnect() {
        let (connector, attempts) = CountingConnector::new(Duration::ZERO);
        let cache = ConnectionCache::new(connector);

        let first = cache.acquire().await.unwrap();
        let second = cache.acquire().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_init_does_not_poison_the_cache() {
        let (connector, attempts) = CountingConnector::new(Duration::ZERO);
        let cache = ConnectionCache::new(connector.failing_first(1));

        let err = cache.acquire().await.err().unwrap();
        assert!(matches!(err, StoreError::Connection(_)));

        // The next call retries and succeeds.
        cache.acquire().await.expect("retry succeeds");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reconnect_replaces_the_handle() {
        let (connector, attempts) = CountingConnector::new(Duration::ZERO);
        let cache = ConnectionCache::new(connector);

        let first = cache.acquire().await.unwrap();
        let replaced = cache.reconnect().await.unwrap();
        let current = cache.acquire().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &replaced));
        assert!(Arc::ptr_eq(&replaced, &current));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_first_caller_leaves_cache_usable() {
        let (connector, _attempts) = CountingConnector::new(Duration::from_millis(50));
        let cache = Arc::new(ConnectionCache::new(connector));

        let task = tokio::spawn({
            let cache = cache.clone();
            async move { cache.acquire().await }
        });
        // Abort while the connect is in flight.
        tokio::time::sleep(Duration::from_millis(5)).await;
        task.abort();
        let _ = task.await;

        // The slot is either empty (retry connects) or holds a finished
        // handle; either way acquire resolves to a usable handle.
        let handle = cache.acquire().await.expect("usable handle");
        handle
            .insert_one("probe", serde_json::json!({"ok": true}))
            .await
            .expect("handle works");
    }
}
