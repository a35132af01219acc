//! Per-reference async locks.
//!
//! Operations on one payment reference run one at a time inside this process.
//! Entries are dropped from the registry once nobody holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use payments_types::Reference;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct ReferenceLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held while a reference is being worked on. Released on drop.
pub struct ReferenceGuard<'a> {
    registry: &'a ReferenceLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ReferenceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other task holds `reference`, then takes it.
    pub async fn acquire(&self, reference: &Reference) -> ReferenceGuard<'_> {
        let key = reference.to_string();
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;

        ReferenceGuard {
            registry: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of references currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for ReferenceGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.registry
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = ReferenceLocks::new();
        let reference = Reference::parse("DEP_1").unwrap();

        let guard = locks.acquire(&reference).await;
        assert_eq!(locks.len(), 1);
        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_reference_is_serialized() {
        let locks = Arc::new(ReferenceLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let reference = Reference::parse("DEP_shared").unwrap();
                let _guard = locks.acquire(&reference).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_references_do_not_block() {
        let locks = ReferenceLocks::new();
        let _a = locks.acquire(&Reference::parse("A").unwrap()).await;
        let _b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&Reference::parse("B").unwrap()),
        )
        .await
        .expect("independent reference should not wait");
        assert_eq!(locks.len(), 2);
    }
}
