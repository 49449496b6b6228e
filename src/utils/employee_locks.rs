use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::lock::{Mutex, OwnedMutexGuard};
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

/// Idle entries are swept after this many acquisitions.
const PRUNE_EVERY: u64 = 1024;

/// Single-writer registry keyed by employee id. Every mutation of one
/// employee's balance or requests runs while holding that employee's guard,
/// so two writers for the same employee never interleave while writers for
/// different employees proceed independently.
///
/// Every read and removal of an entry goes through moka's per-key compute,
/// so an entry is only dropped when nothing outside the cache holds its
/// mutex. A held or awaited lock is never replaced by a fresh one.
#[derive(Clone)]
pub struct EmployeeLocks {
    locks: Cache<u64, Arc<Mutex<()>>>,
    acquisitions: Arc<AtomicU64>,
}

impl Default for EmployeeLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeLocks {
    pub fn new() -> Self {
        Self {
            locks: Cache::builder().build(),
            acquisitions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Waits for exclusive access to `employee_id`.
    pub async fn acquire(&self, employee_id: u64) -> OwnedMutexGuard<()> {
        if self.acquisitions.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune().await;
        }
        self.lock_for(employee_id).await.lock_owned().await
    }

    async fn lock_for(&self, employee_id: u64) -> Arc<Mutex<()>> {
        loop {
            let result = self
                .locks
                .entry(employee_id)
                .and_compute_with(|entry| async move {
                    match entry {
                        Some(_) => Op::Nop,
                        None => Op::Put(Arc::new(Mutex::new(()))),
                    }
                })
                .await;
            match result {
                CompResult::Inserted(entry)
                | CompResult::Unchanged(entry)
                | CompResult::ReplacedWith(entry) => return entry.into_value(),
                CompResult::Removed(_) | CompResult::StillNone(_) => continue,
            }
        }
    }

    /// Drops entries whose mutex nobody holds or waits on.
    async fn prune(&self) {
        let ids: Vec<u64> = self.locks.iter().map(|(id, _)| *id).collect();
        for id in ids {
            self.locks
                .entry(id)
                .and_compute_with(|entry| async move {
                    match entry {
                        // One reference in the cache, one in `entry`.
                        Some(entry) if Arc::strong_count(entry.value()) <= 2 => Op::Remove,
                        _ => Op::Nop,
                    }
                })
                .await;
        }
    }
}
