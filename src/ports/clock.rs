//! Clock port for obtaining the current time.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// Time sessions hand out a clock frozen at (or ticking from) a recorded
/// instant, so code that takes a `Clock` replays deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
