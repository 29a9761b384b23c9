// Per-client GET response cache
//
// Owned by a `RelayClient` instance, never shared globally. Only successful
// JSON replies are stored; entries expire after a fixed TTL and are swept
// on every insert.

use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: DashMap<String, (Instant, Value)>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh entry for `key`. Expired entries are evicted on lookup.
    pub fn get(&self, key: &str) -> Option<Value> {
        let fresh = {
            let entry = self.entries.get(key)?;
            let (stored_at, value) = entry.value();
            (stored_at.elapsed() < self.ttl).then(|| value.clone())
        };
        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    /// Store `value` under `key`, sweeping every expired entry first.
    pub fn insert(&self, key: String, value: Value) {
        let ttl = self.ttl;
        self.entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
