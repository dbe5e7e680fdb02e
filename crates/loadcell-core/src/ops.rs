use crate::compute::accumulate;
use crate::counter::RequestCounter;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Fixed greeting returned by the parameterless hello operation.
pub const GREETING: &str = "Hello from Liberty!";

const SLOW_DONE_MESSAGE: &str = "Slow request completed";
const COMPUTE_DONE_MESSAGE: &str = "Computation completed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echoed {
    pub echo: String,
    /// Unicode scalar-value count of the echoed message, not its byte
    /// length.
    pub length: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowDone {
    pub message: String,
    pub delay: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Computed {
    pub message: String,
    pub iterations: u64,
    pub result: f64,
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub uptime: Duration,
    pub started_at: DateTime<Utc>,
    pub current_time: DateTime<Utc>,
}

/// Returned when a slow wait is cancelled before it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request interrupted")
    }
}

impl std::error::Error for Interrupted {}

/// The workload operations, built around one shared [`RequestCounter`].
///
/// Every operation that represents a handled request counts itself;
/// callers never touch the counter directly. Input validation belongs
/// to the boundary layer: by the time an operation runs, its arguments
/// are in range.
pub struct Workload {
    counter: RequestCounter,
}

impl Workload {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: RequestCounter::new(),
        }
    }

    #[must_use]
    pub fn counter(&self) -> &RequestCounter {
        &self.counter
    }

    pub fn greet(&self) -> Greeting {
        self.counter.record();
        Greeting {
            message: GREETING.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// `name` is formatted verbatim, with no trimming or escaping, so
    /// unicode and punctuation survive the round trip.
    pub fn greet_name(&self, name: &str) -> Greeting {
        self.counter.record();
        Greeting {
            message: format!("Hello, {name}!"),
            timestamp: Utc::now(),
        }
    }

    pub fn echo(&self, message: &str) -> Echoed {
        self.counter.record();
        Echoed {
            length: message.chars().count(),
            echo: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Suspends the calling task for `delay`, racing the wait against
    /// `cancel`. The counter moves only after the full wait completes;
    /// a cancelled wait returns [`Interrupted`] and leaves the counter
    /// untouched.
    pub async fn slow(
        &self,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<SlowDone, Interrupted> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Interrupted),
            () = tokio::time::sleep(delay) => {}
        }
        self.counter.record();
        Ok(SlowDone {
            message: SLOW_DONE_MESSAGE.to_string(),
            delay,
            timestamp: Utc::now(),
        })
    }

    pub fn compute(&self, iterations: u64) -> Computed {
        let started = Instant::now();
        let result = accumulate(iterations);
        let duration = started.elapsed();
        self.counter.record();
        Computed {
            message: COMPUTE_DONE_MESSAGE.to_string(),
            iterations,
            result,
            duration,
            timestamp: Utc::now(),
        }
    }

    /// Read-only; does not count itself.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.counter.total(),
            uptime: self.counter.uptime(),
            started_at: self.counter.started_at(),
            current_time: Utc::now(),
        }
    }

    /// Atomically swaps the counter to zero, returning the pre-reset
    /// value.
    pub fn reset(&self) -> u64 {
        self.counter.reset()
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn greetings_format_the_reference_messages() {
        let workload = Workload::new();
        assert_eq!(workload.greet().message, "Hello from Liberty!");
        assert_eq!(workload.greet_name("World").message, "Hello, World!");
        assert_eq!(workload.greet_name("Alice").message, "Hello, Alice!");
        assert_eq!(workload.greet_name("Jürgen").message, "Hello, Jürgen!");
        assert_eq!(
            workload.greet_name("O'Connor-Smith").message,
            "Hello, O'Connor-Smith!"
        );
    }

    #[test]
    fn echo_round_trips_and_counts_scalar_values() {
        let workload = Workload::new();
        let outcome = workload.echo("test");
        assert_eq!(outcome.echo, "test");
        assert_eq!(outcome.length, 4);

        assert_eq!(workload.echo("日本語").length, 3);
        assert_eq!(workload.echo("O'Connor-Smith").length, 14);
    }

    #[test]
    fn four_call_scenario_counts_four_requests() {
        let workload = Workload::new();
        workload.greet();
        workload.greet();
        workload.greet_name("Test");
        workload.echo("test");
        assert_eq!(workload.stats().total_requests, 4);
        assert_eq!(workload.reset(), 4);
        assert_eq!(workload.stats().total_requests, 0);
    }

    #[test]
    fn stats_does_not_count_itself() {
        let workload = Workload::new();
        workload.stats();
        workload.stats();
        assert_eq!(workload.stats().total_requests, 0);
    }

    #[tokio::test]
    async fn slow_waits_the_requested_delay_then_counts() {
        let workload = Workload::new();
        let cancel = CancellationToken::new();
        let started = Instant::now();
        let outcome = workload
            .slow(Duration::from_millis(120), &cancel)
            .await
            .expect("uncancelled wait completes");
        let elapsed = started.elapsed();
        assert_eq!(outcome.delay, Duration::from_millis(120));
        assert!(elapsed >= Duration::from_millis(100), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1000), "waited {elapsed:?}");
        assert_eq!(workload.counter().total(), 1);
    }

    #[tokio::test]
    async fn slow_zero_returns_promptly() {
        let workload = Workload::new();
        let cancel = CancellationToken::new();
        let outcome = workload
            .slow(Duration::ZERO, &cancel)
            .await
            .expect("zero wait completes");
        assert_eq!(outcome.delay, Duration::ZERO);
        assert_eq!(workload.counter().total(), 1);
    }

    #[tokio::test]
    async fn cancelled_slow_reports_interrupted_without_counting() {
        let workload = Arc::new(Workload::new());
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });
        let started = Instant::now();
        let outcome = workload.slow(Duration::from_secs(5), &cancel).await;
        assert_eq!(outcome, Err(Interrupted));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(workload.counter().total(), 0);
    }

    #[tokio::test]
    async fn already_cancelled_token_interrupts_even_a_zero_wait() {
        let workload = Workload::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = workload.slow(Duration::ZERO, &cancel).await;
        assert_eq!(outcome, Err(Interrupted));
        assert_eq!(workload.counter().total(), 0);
    }

    #[test]
    fn compute_is_deterministic_and_counts() {
        let workload = Workload::new();
        let first = workload.compute(1000);
        let second = workload.compute(1000);
        assert_eq!(first.result.to_bits(), second.result.to_bits());
        assert_eq!(first.iterations, 1000);
        assert_eq!(workload.counter().total(), 2);
    }

    #[tokio::test]
    async fn concurrent_operations_lose_no_counts() {
        let workload = Arc::new(Workload::new());
        let mut handles = Vec::new();
        for i in 0..40 {
            let workload = Arc::clone(&workload);
            handles.push(tokio::spawn(async move {
                match i % 4 {
                    0 => {
                        workload.greet();
                    }
                    1 => {
                        workload.greet_name("load");
                    }
                    2 => {
                        workload.echo("payload");
                    }
                    _ => {
                        workload.compute(10);
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.expect("operation task");
        }
        assert_eq!(workload.stats().total_requests, 40);
    }
}
