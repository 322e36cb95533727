//! Time travel: a recorded instant that code under test reads through [`Clock`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::adapters::live::LiveClock;
use crate::cassette::mode::RecordMode;
use crate::cassette::path::TestId;
use crate::cassette::session::activate;
use crate::cassette::store;
use crate::error::RecorderError;
use crate::kind::RecordKind;
use crate::options::RecordOptions;
use crate::ports::clock::Clock;

/// Where a test travels to and whether time moves once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelSpec {
    /// Destination instant, stored as RFC 3339 with its offset.
    #[serde(rename = "isoformat")]
    pub instant: DateTime<FixedOffset>,
    /// Whether the clock keeps running from the destination.
    pub tick: bool,
}

impl TravelSpec {
    /// A clock stopped at `instant`.
    #[must_use]
    pub fn frozen(instant: DateTime<FixedOffset>) -> Self {
        Self { instant, tick: false }
    }

    /// A clock that starts at `instant` and keeps running.
    #[must_use]
    pub fn ticking(instant: DateTime<FixedOffset>) -> Self {
        Self { instant, tick: true }
    }
}

/// Clock driven by a [`TravelSpec`].
#[derive(Debug, Clone)]
pub struct TravelClock {
    start: DateTime<Utc>,
    tick: bool,
    origin: Instant,
}

impl TravelClock {
    /// Starts the clock at the travel instant.
    #[must_use]
    pub fn new(spec: TravelSpec) -> Self {
        Self { start: spec.instant.with_timezone(&Utc), tick: spec.tick, origin: Instant::now() }
    }
}

impl Clock for TravelClock {
    fn now(&self) -> DateTime<Utc> {
        if !self.tick {
            return self.start;
        }
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
        self.start + elapsed
    }
}

/// The time session of one test.
///
/// Capture persists the destination (or the current time when none is given)
/// as soon as the session opens. Replay loads it. An unmarked test gets the
/// live clock.
pub struct TimeTravel {
    path: PathBuf,
    mode: Option<RecordMode>,
    spec: Option<TravelSpec>,
    clock: Arc<dyn Clock>,
}

impl TimeTravel {
    /// Opens the time session of `test`.
    ///
    /// # Errors
    ///
    /// Returns an error if the marked kind has no record and was not
    /// requested, or if the record cannot be written or read.
    pub fn open(
        test: &TestId,
        options: &RecordOptions,
        destination: Option<TravelSpec>,
    ) -> Result<Self, RecorderError> {
        let (path, mode) = activate(test, options, RecordKind::Time)?;
        let spec = match mode {
            None => None,
            Some(RecordMode::Capture) => {
                let spec = destination.unwrap_or_else(|| TravelSpec::frozen(Utc::now().into()));
                store::save(&path, &spec)?;
                Some(spec)
            }
            Some(_) => Some(store::load::<TravelSpec>(&path)?),
        };
        let clock: Arc<dyn Clock> = match spec {
            Some(spec) => Arc::new(TravelClock::new(spec)),
            None => Arc::new(LiveClock),
        };
        Ok(Self { path, mode, spec, clock })
    }

    /// Clock to hand to the code under test.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// The destination in effect, or `None` when the session is inert.
    #[must_use]
    pub fn spec(&self) -> Option<TravelSpec> {
        self.spec
    }

    /// Decided mode, or `None` when the session is inert.
    #[must_use]
    pub fn mode(&self) -> Option<RecordMode> {
        self.mode
    }

    /// Record path of the session.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
