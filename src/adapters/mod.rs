//! Adapter implementations of the ports.
//!
//! `live` talks to real systems, `recording` wraps any implementation and
//! captures what passes through, `replaying` answers from a cassette.

pub mod live;
pub mod recording;
pub mod replaying;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, carrying on with the data if a holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
