use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process TTL key-value cache with wildcard invalidation.
/// Values are serialized JSON strings; callers own the (de)serialization.
#[derive(Clone, Default)]
pub struct TtlCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        {
            let map = self.inner.read().await;
            match map.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired entry observed under the read lock; drop it.
        self.inner.write().await.remove(key);
        None
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.inner.write().await.insert(key.to_string(), entry);
    }

    /// Removes every key matching `pattern`. A trailing `*` makes the
    /// pattern a prefix match; anything else is an exact key.
    pub async fn delete_by_pattern(&self, pattern: &str) -> usize {
        let mut map = self.inner.write().await;
        let before = map.len();

        match pattern.strip_suffix('*') {
            Some(prefix) => map.retain(|key, _| !key.starts_with(prefix)),
            None => {
                map.remove(pattern);
            }
        }

        before - map.len()
    }
}
