//! Duplicate suppression
//!
//! A process-wide, time-decaying guard set used by handlers that must stay
//! idempotent under at-least-once event delivery. The check-and-insert is a
//! single atomic operation, so two concurrent duplicates can never both win.
//!
//! Expiry is a single sweep over a min-heap of `(deadline, key)` pairs
//! instead of one detached timer per entry, keeping background work bounded
//! under high event volume.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(PartialEq, Eq)]
struct ExpiryEntry {
    expires_at: Instant,
    /// Insertion stamp of the guarded entry this deadline belongs to; a
    /// released-and-reinserted key must not be evicted by a stale deadline.
    inserted_at: Instant,
    key: String,
}

impl Ord for ExpiryEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.expires_at
            .cmp(&other.expires_at)
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for ExpiryEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// TTL-bounded guard cache.
///
/// `guard` returns `true` only for the first observer of a key inside the
/// TTL window; the caller performs the guarded side effect and calls
/// `release` if that side effect fails, so a genuine upstream redelivery is
/// not permanently suppressed.
pub struct DedupCache {
    ttl: Duration,
    entries: DashMap<String, Instant>,
    expiries: Mutex<BinaryHeap<Reverse<ExpiryEntry>>>,
}

impl DedupCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            expiries: Mutex::new(BinaryHeap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Atomic check-and-insert. `true` means this caller is the first
    /// observer and owns the guarded action.
    pub fn guard(&self, key: &str) -> bool {
        self.sweep();

        let now = Instant::now();
        let first = match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        };

        if first {
            self.expiries.lock().push(Reverse(ExpiryEntry {
                expires_at: now + self.ttl,
                inserted_at: now,
                key: key.to_string(),
            }));
            debug!(key, "Dedup guard acquired");
        } else {
            debug!(key, "Dedup guard hit, duplicate suppressed");
        }
        first
    }

    /// Evict a key immediately. Called when the guarded action fails, so the
    /// next delivery of the same event is treated as fresh.
    pub fn release(&self, key: &str) {
        self.entries.remove(key);
        debug!(key, "Dedup guard released");
    }

    /// Drop every entry whose deadline has passed. Runs lazily on each
    /// `guard`; can also be driven by [`DedupCache::spawn_sweeper`].
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut expiries = self.expiries.lock();
        while expiries
            .peek()
            .is_some_and(|Reverse(head)| head.expires_at <= now)
        {
            if let Some(Reverse(expired)) = expiries.pop() {
                // Only evict if the live entry is the one this deadline was
                // created for; otherwise the deadline is stale.
                self.entries
                    .remove_if(&expired.key, |_, stamp| *stamp == expired.inserted_at);
            }
        }
    }

    /// Number of currently guarded keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Background sweep loop for deployments where `guard` is called rarely.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                cache.sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_first_observer_wins() {
        let cache = DedupCache::new(TTL);
        assert!(cache.guard("CALL1:+1555"));
        assert!(!cache.guard("CALL1:+1555"));
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let cache = DedupCache::new(TTL);
        assert!(cache.guard("CALL1:+1555"));
        assert!(cache.guard("CALL2:+1555"));
        assert!(cache.guard("CALL1:+1666"));
    }

    #[tokio::test]
    async fn test_release_allows_retry() {
        let cache = DedupCache::new(TTL);
        assert!(cache.guard("CALL1:+1555"));
        cache.release("CALL1:+1555");
        assert!(cache.guard("CALL1:+1555"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_natural_expiry() {
        let cache = DedupCache::new(TTL);
        assert!(cache.guard("CALL1:+1555"));

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert!(!cache.guard("CALL1:+1555"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.guard("CALL1:+1555"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_deadline_does_not_evict_reinserted_key() {
        let cache = DedupCache::new(TTL);
        assert!(cache.guard("K"));
        cache.release("K");

        tokio::time::advance(TTL / 2).await;
        assert!(cache.guard("K"));

        // The original deadline passes, but the re-inserted entry is newer
        // and must survive until its own deadline.
        tokio::time::advance(TTL / 2 + Duration::from_secs(1)).await;
        assert!(!cache.guard("K"));

        tokio::time::advance(TTL / 2).await;
        assert!(cache.guard("K"));
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_single_winner() {
        let cache = Arc::new(DedupCache::new(TTL));
        let mut handles = Vec::new();
        for _ in 0..32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.guard("SAME") }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_expired_entries() {
        let cache = DedupCache::new(TTL);
        cache.guard("A");
        cache.guard("B");
        assert_eq!(cache.len(), 2);

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        cache.sweep();
        assert!(cache.is_empty());
    }
}
