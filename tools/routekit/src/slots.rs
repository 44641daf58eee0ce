//! Query slot pool
//!
//! The engine keeps mutable scratch state per slot index. A slot is held by at
//! most one caller at a time; [`SlotGuard`] returns it on drop, unwinding included.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Fixed set of slot tokens `0..capacity`
#[derive(Debug)]
pub struct QuerySlotPool {
    free: Mutex<Vec<usize>>,
    returned: Condvar,
    capacity: usize,
}

impl QuerySlotPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new((0..capacity).rev().collect()),
            returned: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently checked out
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Block until a slot is free.
    pub fn acquire(&self) -> SlotGuard<'_> {
        let mut free = self.free.lock();
        loop {
            if let Some(slot) = free.pop() {
                return SlotGuard { pool: self, slot };
            }
            self.returned.wait(&mut free);
        }
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<SlotGuard<'_>> {
        self.free
            .lock()
            .pop()
            .map(|slot| SlotGuard { pool: self, slot })
    }

    /// Wait at most `timeout` for a slot.
    ///
    /// Only the wait is bounded; a query running on the slot afterwards is not.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<SlotGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut free = self.free.lock();
        loop {
            if let Some(slot) = free.pop() {
                return Some(SlotGuard { pool: self, slot });
            }
            if self.returned.wait_until(&mut free, deadline).timed_out() {
                return free.pop().map(|slot| SlotGuard { pool: self, slot });
            }
        }
    }

    fn release(&self, slot: usize) {
        let mut free = self.free.lock();
        debug_assert!(!free.contains(&slot), "slot {slot} released twice");
        free.push(slot);
        drop(free);
        self.returned.notify_one();
    }
}

/// Exclusive hold on one slot
#[derive(Debug)]
pub struct SlotGuard<'a> {
    pool: &'a QuerySlotPool,
    slot: usize,
}

impl SlotGuard<'_> {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.pool.release(self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn test_slots_are_distinct() {
        let pool = QuerySlotPool::new(3);
        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();

        let mut slots = vec![a.slot(), b.slot(), c.slot()];
        slots.sort_unstable();
        assert_eq!(slots, vec![0, 1, 2]);
        assert!(pool.try_acquire().is_none());
        assert_eq!(pool.available(), 0);

        drop(b);
        assert_eq!(pool.available(), 1);
        assert!(pool.try_acquire().is_some());
    }

    #[test]
    fn test_acquire_timeout() {
        let pool = QuerySlotPool::new(1);
        let held = pool.acquire();
        assert!(pool.acquire_timeout(Duration::from_millis(20)).is_none());
        drop(held);
        assert_eq!(pool.acquire_timeout(Duration::from_millis(20)).map(|g| g.slot()), Some(0));
    }

    #[test]
    fn test_slot_returned_on_panic() {
        let pool = QuerySlotPool::new(1);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = pool.acquire();
            panic!("query failed");
        }));
        assert!(result.is_err());
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_blocked_acquire_wakes_on_release() {
        let pool = QuerySlotPool::new(1);
        let held = pool.acquire();
        std::thread::scope(|s| {
            let waiter = s.spawn(|| pool.acquire().slot());
            std::thread::sleep(Duration::from_millis(20));
            drop(held);
            assert_eq!(waiter.join().unwrap(), 0);
        });
    }

    #[test]
    fn test_no_slot_is_double_held() {
        const N: usize = 4;
        let pool = QuerySlotPool::new(N);
        let held: Vec<AtomicBool> = (0..N).map(|_| AtomicBool::new(false)).collect();
        let outstanding = AtomicUsize::new(0);
        let max_outstanding = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..10 * N {
                s.spawn(|| {
                    for _ in 0..200 {
                        let guard = pool.acquire();
                        let now = outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                        max_outstanding.fetch_max(now, Ordering::SeqCst);
                        assert!(
                            !held[guard.slot()].swap(true, Ordering::SeqCst),
                            "slot {} handed out twice",
                            guard.slot()
                        );
                        std::thread::yield_now();
                        held[guard.slot()].store(false, Ordering::SeqCst);
                        outstanding.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert!(max_outstanding.load(Ordering::SeqCst) <= N);
        assert_eq!(pool.available(), N);
    }
}
