//! Cached clock for ultra-fast timestamping.
//!
//! ## The Problem with Direct Syscalls
//!
//! ```text
//! [event 1] -> syscall -> get time (~200ns)
//! [event 2] -> syscall -> get time (~200ns)
//! ... at 1M events/sec that is 200ms/sec lost to syscalls
//! ```
//!
//! A background task refreshes a single cached nanosecond value every 1ms; hot
//! paths (mempool decode, pool cache lookups, detector scoring) read that
//! atomic instead of calling into the kernel.
//!
//! Every timestamp on the ingest path should come from here rather than
//! `SystemTime::now()` directly, so drift and overflow handling stay in one
//! place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct CachedClock {
    current_time_ns: Arc<AtomicU64>,
}

static GLOBAL_CLOCK: std::sync::OnceLock<CachedClock> = std::sync::OnceLock::new();

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

impl CachedClock {
    pub fn new(update_interval: Duration) -> Self {
        let initial_time = Self::fetch_real_time_ns();
        let clock = Self {
            current_time_ns: Arc::new(AtomicU64::new(initial_time)),
        };
        clock.start_updater_task(update_interval);
        clock
    }

    #[inline(always)]
    pub fn now_ns(&self) -> u64 {
        self.current_time_ns.load(Ordering::Relaxed)
    }

    fn start_updater_task(&self, update_interval: Duration) {
        let time_arc = self.current_time_ns.clone();

        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(update_interval);
                interval.tick().await;

                loop {
                    interval.tick().await;
                    let now = Self::fetch_real_time_ns();
                    time_arc.store(now, Ordering::Relaxed);
                }
            });
        }
    }

    fn fetch_real_time_ns() -> u64 {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        safe_duration_to_ns(duration)
    }
}

/// Starts the global cached clock with the default 1ms refresh interval.
/// Safe to call more than once; later calls are no-ops.
pub fn init_timestamp_system() {
    GLOBAL_CLOCK.get_or_init(|| CachedClock::new(DEFAULT_UPDATE_INTERVAL));
}

#[inline(always)]
pub fn fast_timestamp_ns() -> u64 {
    let clock = GLOBAL_CLOCK.get_or_init(|| CachedClock::new(DEFAULT_UPDATE_INTERVAL));
    clock.now_ns()
}

#[inline(always)]
pub fn current_timestamp_ns() -> u64 {
    fast_timestamp_ns()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    Overflow {
        ns_value: u128,
        max_value: u64,
        overflow_year: u128,
    },
    SystemTimeError,
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampError::Overflow {
                ns_value,
                max_value,
                overflow_year,
            } => write!(
                f,
                "timestamp overflow: {} ns exceeds u64::MAX ({}), corresponds to year {}",
                ns_value, max_value, overflow_year
            ),
            TimestampError::SystemTimeError => write!(f, "system time before UNIX epoch"),
        }
    }
}

impl std::error::Error for TimestampError {}

pub fn safe_duration_to_ns_checked(duration: Duration) -> Result<u64, TimestampError> {
    let ns_u128 = duration.as_nanos();

    if ns_u128 > u64::MAX as u128 {
        let overflow_seconds = ns_u128 / 1_000_000_000;
        let seconds_per_year = (365.25 * 24.0 * 3600.0) as u128;
        let overflow_year = 1970 + overflow_seconds / seconds_per_year;

        return Err(TimestampError::Overflow {
            ns_value: ns_u128,
            max_value: u64::MAX,
            overflow_year,
        });
    }

    Ok(ns_u128 as u64)
}

/// Panics on overflow (post year-2554); callers on the hot path accept this
/// rather than threading a `Result` through every timestamp call.
pub fn safe_duration_to_ns(duration: Duration) -> u64 {
    match safe_duration_to_ns_checked(duration) {
        Ok(ns) => ns,
        Err(e) => panic!("timestamp conversion error: {}", e),
    }
}

pub fn safe_system_timestamp_ns_checked() -> Result<u64, TimestampError> {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => safe_duration_to_ns_checked(duration),
        Err(_) => Err(TimestampError::SystemTimeError),
    }
}

pub fn safe_system_timestamp_ns() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => safe_duration_to_ns(duration),
        Err(e) => {
            tracing::warn!("system time before UNIX epoch: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn cached_clock_reads_recent_time() {
        let clock = CachedClock::new(Duration::from_millis(10));
        let timestamp = clock.now_ns();
        assert!(timestamp > 1_600_000_000_000_000_000); // after 2020
    }

    #[tokio::test]
    async fn cached_clock_updates_in_background() {
        let clock = CachedClock::new(Duration::from_millis(5));
        let first = clock.now_ns();
        tokio::time::sleep(Duration::from_millis(15)).await;
        let second = clock.now_ns();
        assert!(second >= first);
    }

    #[test]
    fn fast_timestamp_auto_initializes() {
        let a = fast_timestamp_ns();
        assert!(a > 0);
        init_timestamp_system();
        let b = fast_timestamp_ns();
        assert!(b >= a);
    }

    #[test]
    fn conversion_matches_known_value() {
        let d = Duration::from_secs(1_000_000_000);
        assert_eq!(safe_duration_to_ns(d), 1_000_000_000_000_000_000);
    }

    #[test]
    #[should_panic(expected = "timestamp conversion error")]
    fn conversion_panics_on_overflow() {
        let max_safe_seconds = u64::MAX / 1_000_000_000;
        safe_duration_to_ns(Duration::from_secs(max_safe_seconds + 1));
    }

    #[test]
    fn cached_clock_perf_is_sub_microsecond() {
        for _ in 0..1000 {
            std::hint::black_box(fast_timestamp_ns());
        }
        let start = Instant::now();
        const ITERATIONS: usize = 100_000;
        for _ in 0..ITERATIONS {
            std::hint::black_box(fast_timestamp_ns());
        }
        let ns_per_op = start.elapsed().as_nanos() as f64 / ITERATIONS as f64;
        assert!(ns_per_op < 1000.0, "clock read too slow: {:.2} ns/op", ns_per_op);
    }
}
