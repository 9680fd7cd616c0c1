use std::{
    future::Future,
    hash::Hash,
    num::NonZeroUsize,
    sync::Arc,
    time::{Duration, Instant},
};

use lru::LruCache;
use tokio::sync::{Mutex, OnceCell};

struct Slot<V, E> {
    created: Instant,
    cell: Arc<OnceCell<Result<V, E>>>,
}

impl<V, E> Clone for Slot<V, E> {
    fn clone(&self) -> Self {
        Self { created: self.created, cell: self.cell.clone() }
    }
}

impl<V, E> Slot<V, E> {
    fn fresh() -> Self {
        Self { created: Instant::now(), cell: Arc::new(OnceCell::new()) }
    }
}

/// How a lookup was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Served from a finished earlier computation.
    Hit,
    /// Waited on a computation another caller started.
    Joined,
    /// This caller ran the computation.
    Computed,
}

/// Bounded TTL result cache where concurrent callers for one key share a
/// single in-flight computation. Failed computations are handed to everyone
/// who was waiting on them, then evicted. Expired entries are swept whenever a
/// new key is inserted, and the least recently used entry goes once
/// `capacity` is reached.
pub struct SingleFlightCache<K, V, E> {
    ttl: Duration,
    entries: Mutex<LruCache<K, Slot<V, E>>>,
}

impl<K, V, E> SingleFlightCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self { ttl, entries: Mutex::new(LruCache::new(capacity)) }
    }

    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> (Result<V, E>, Lookup)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = {
            let mut entries = self.entries.lock().await;
            let live = entries.get(&key).filter(|s| s.created.elapsed() < self.ttl).cloned();
            match live {
                Some(slot) => slot,
                None => {
                    self.sweep_expired(&mut entries);
                    let slot = Slot::fresh();
                    entries.put(key.clone(), slot.clone());
                    slot
                }
            }
        };

        let finished = slot.cell.initialized();
        let mut ran = false;
        let result = slot
            .cell
            .get_or_init(|| {
                ran = true;
                compute()
            })
            .await
            .clone();
        let lookup = match (finished, ran) {
            (true, _) => Lookup::Hit,
            (false, true) => Lookup::Computed,
            (false, false) => Lookup::Joined,
        };

        if result.is_err() {
            let mut entries = self.entries.lock().await;
            if entries.peek(&key).is_some_and(|current| Arc::ptr_eq(&current.cell, &slot.cell)) {
                entries.pop(&key);
            }
        }
        (result, lookup)
    }

    fn sweep_expired(&self, entries: &mut LruCache<K, Slot<V, E>>) {
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, s)| s.created.elapsed() >= self.ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            entries.pop(&key);
        }
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
