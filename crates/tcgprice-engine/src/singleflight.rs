//! Per-key coalescing of concurrent resolutions.
//!
//! While a future for a key is in flight, later callers with the same key
//! await that future instead of starting their own. Entries hold only weak
//! handles, so a resolution every caller has abandoned is dropped and a
//! finished one is never handed to a new caller.

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

type Flight<T> = Shared<BoxFuture<'static, T>>;

/// Coalesces concurrent futures by key.
pub struct SingleFlight<K, T> {
    inflight: Mutex<HashMap<K, WeakShared<BoxFuture<'static, T>>>>,
}

impl<K, T> Default for SingleFlight<K, T> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the in-flight future for `key`, or start `make()` if none.
    ///
    /// `make` is only called when this caller becomes the leader.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = self.join_or_start(&key, make);
        let output = flight.clone().await;
        self.finish(&key, &flight);
        output
    }

    /// Number of keys currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let map = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        map.values().filter(|weak| weak.upgrade().is_some()).count()
    }

    fn join_or_start<F, Fut>(&self, key: &K, make: F) -> Flight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut map = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = map.get(key).and_then(WeakShared::upgrade) {
            if existing.peek().is_none() {
                tracing::debug!("Joining in-flight resolution");
                return existing;
            }
        }

        let flight = make().boxed().shared();
        if let Some(weak) = flight.downgrade() {
            map.insert(key.clone(), weak);
        }
        flight
    }

    fn finish(&self, key: &K, flight: &Flight<T>) {
        let mut map = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let ours = map
            .get(key)
            .and_then(WeakShared::upgrade)
            .map_or(true, |current| current.ptr_eq(flight));
        if ours {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_run() {
        let flights: Arc<SingleFlight<String, u32>> = Arc::new(SingleFlight::new());
        let runs = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let flights = flights.clone();
            let runs = runs.clone();
            handles.push(tokio::spawn(async move {
                flights
                    .run("BLTR-EN051".to_string(), move || async move {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        runs.fetch_add(1, Ordering::SeqCst) + 7
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.expect("task"), 7);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_sequential_callers_run_again() {
        let flights: SingleFlight<&str, u32> = SingleFlight::new();
        let runs = Arc::new(AtomicU32::new(0));

        for expected in 1..=2 {
            let runs = runs.clone();
            let out = flights
                .run("key", move || async move { runs.fetch_add(1, Ordering::SeqCst) + 1 })
                .await;
            assert_eq!(out, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_do_not_coalesce() {
        let flights: Arc<SingleFlight<u32, u32>> = Arc::new(SingleFlight::new());

        let a = flights.run(1, || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            1
        });
        let b = flights.run(2, || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            2
        });

        assert_eq!(tokio::join!(a, b), (1, 2));
    }
}
