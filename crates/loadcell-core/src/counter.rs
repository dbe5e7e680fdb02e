use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared request counter with an uptime baseline.
///
/// One instance lives for the process lifetime, owned by the service
/// state and shared behind `Arc` rather than a static. All mutation is
/// a single atomic instruction, so concurrent increments cannot lose
/// updates and a reset cannot observe a half-applied increment.
pub struct RequestCounter {
    total: AtomicU64,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl RequestCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Counts one handled request and returns the new total.
    pub fn record(&self) -> u64 {
        self.total.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Resets the counter to zero and returns the pre-reset value in
    /// one indivisible step.
    pub fn reset(&self) -> u64 {
        self.total.swap(0, Ordering::Relaxed)
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RequestCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn concurrent_increments_are_never_lost() {
        let counter = Arc::new(RequestCounter::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    counter.record();
                }
            }));
        }
        for handle in handles {
            handle.join().expect("increment thread");
        }
        assert_eq!(counter.total(), 8000);
    }

    #[test]
    fn reset_returns_pre_reset_value_and_zeroes_the_counter() {
        let counter = RequestCounter::new();
        counter.record();
        counter.record();
        counter.record();
        assert_eq!(counter.reset(), 3);
        assert_eq!(counter.total(), 0);
    }

    #[test]
    fn concurrent_resets_and_increments_conserve_every_count() {
        let counter = Arc::new(RequestCounter::new());
        let reclaimed = Arc::new(AtomicU64::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    counter.record();
                }
            }));
        }
        for _ in 0..2 {
            let counter = Arc::clone(&counter);
            let reclaimed = Arc::clone(&reclaimed);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    reclaimed.fetch_add(counter.reset(), Ordering::Relaxed);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("counter thread");
        }
        // Every increment ends up either in a reset's returned value or
        // in the final counter; none may vanish or double-count.
        let observed = reclaimed.load(Ordering::Relaxed) + counter.total();
        assert_eq!(observed, 2000);
    }
}
