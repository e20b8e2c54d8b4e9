use crate::core::cache::{Cache, CachePolicy};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue<V> {
    value: V,
    inserted_at: Instant,
}

struct Entries<K, V> {
    map: HashMap<K, CacheValue<V>>,
    // Insertion order, front is oldest. Always holds exactly the keys of `map`.
    order: VecDeque<K>,
}

impl<K, V> Entries<K, V>
where
    K: Eq + Hash + Clone,
{
    fn unlink(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    fn purge_expired(&mut self, policy: &CachePolicy) {
        let now = Instant::now();
        let map = &mut self.map;
        self.order.retain(|key| {
            let alive = map
                .get(key)
                .is_some_and(|entry| now.duration_since(entry.inserted_at) < policy.ttl);
            if !alive {
                map.remove(key);
            }
            alive
        });
    }
}

/// In-memory TTL cache with oldest-inserted eviction once `capacity` is
/// exceeded. Expiry is lazy: stale entries are dropped when touched.
pub struct MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    policy: CachePolicy,
    inner: Mutex<Entries<K, V>>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.inner.lock().await;
        let expired = match entries.map.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.policy.ttl => {
                debug!("Cache HIT for key: {:?}", key);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!("Cache entry expired for key: {:?}", key);
            entries.map.remove(key);
            entries.unlink(key);
        } else {
            debug!("Cache MISS for key: {:?}", key);
        }
        None
    }

    async fn put(&self, key: K, value: V) {
        let mut entries = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);

        if entries.map.contains_key(&key) {
            entries.unlink(&key);
        }
        entries.order.push_back(key.clone());
        entries.map.insert(
            key,
            CacheValue {
                value,
                inserted_at: Instant::now(),
            },
        );

        while entries.map.len() > self.policy.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            debug!("Cache EVICT for key: {:?}", oldest);
            entries.map.remove(&oldest);
        }
    }

    async fn clear(&self) {
        let mut entries = self.inner.lock().await;
        entries.map.clear();
        entries.order.clear();
        debug!("Cache CLEAR");
    }

    async fn len(&self) -> usize {
        let mut entries = self.inner.lock().await;
        entries.purge_expired(&self.policy);
        entries.map.len()
    }

    async fn keys(&self) -> Vec<K> {
        let mut entries = self.inner.lock().await;
        entries.purge_expired(&self.policy);
        entries.order.iter().cloned().collect()
    }

    async fn values(&self) -> Vec<V> {
        let mut entries = self.inner.lock().await;
        entries.purge_expired(&self.policy);
        entries
            .order
            .iter()
            .filter_map(|key| entries.map.get(key).map(|entry| entry.value.clone()))
            .collect()
    }
}
