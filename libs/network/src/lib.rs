//! Monotonic clock and transport-adjacent error types shared across the workspace.
//!
//! Trimmed down to the two pieces every chain adapter and relay client needs:
//! a cheap, cached nanosecond clock (`time`) and a structured error enum for
//! things that go wrong talking to the outside world (`error`).

pub mod error;
pub mod time;

pub use error::{NetworkError, Result};
pub use time::{
    current_timestamp_ns, fast_timestamp_ns, init_timestamp_system, safe_system_timestamp_ns,
    safe_system_timestamp_ns_checked, CachedClock, TimestampError,
};
