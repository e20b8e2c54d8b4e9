use async_trait::async_trait;
use std::time::Duration;

/// Four hours, matching how often the upstream sources publish new prices.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 4);
pub const DEFAULT_CAPACITY: usize = 128;

/// Expiry and size bounds applied to every entry of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub capacity: usize,
}

impl CachePolicy {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { ttl, capacity }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// A bounded key-value store whose entries disappear once they outlive the
/// policy's TTL.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Option<V>;
    async fn put(&self, key: K, value: V);
    async fn clear(&self);

    /// Number of live entries.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Live keys, oldest insertion first.
    async fn keys(&self) -> Vec<K>;

    /// Live values, oldest insertion first.
    async fn values(&self) -> Vec<V>;
}
