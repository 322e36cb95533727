//! Records interactions into a cassette file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::config::FilterSpec;
use super::format::{Cassette, FtpInteraction, Interaction};
use super::store;
use crate::error::RecorderError;
use crate::filter;

/// An entry type that can be stored in a cassette.
pub trait Recordable: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Runs the capture-time filters; `None` drops the entry.
    fn filtered(self, spec: &FilterSpec) -> Option<Self>;
}

impl Recordable for Interaction {
    fn filtered(self, spec: &FilterSpec) -> Option<Self> {
        filter::apply(self, spec)
    }
}

impl Recordable for FtpInteraction {
    fn filtered(self, spec: &FilterSpec) -> Option<Self> {
        filter::apply_ftp(self, spec)
    }
}

/// Whether a cassette with no interactions is still written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Always write, even an empty cassette.
    Always,
    /// Write only when something was recorded.
    SkipEmpty,
}

/// Collects filtered interactions and writes them to a cassette on finish.
#[derive(Debug)]
pub struct CassetteRecorder<I = Interaction> {
    path: PathBuf,
    filters: Arc<FilterSpec>,
    policy: SavePolicy,
    interactions: Vec<I>,
    finished: bool,
}

impl<I: Recordable> CassetteRecorder<I> {
    /// Create a new recorder that will write to the given path.
    pub fn new(path: impl Into<PathBuf>, filters: Arc<FilterSpec>, policy: SavePolicy) -> Self {
        Self { path: path.into(), filters, policy, interactions: Vec::new(), finished: false }
    }

    /// Filters and appends an interaction. Returns whether it was kept.
    pub fn record(&mut self, interaction: I) -> bool {
        if self.finished {
            warn!(path = %self.path.display(), "Interaction arrived after the cassette was written");
            return false;
        }
        match interaction.filtered(&self.filters) {
            Some(kept) => {
                self.interactions.push(kept);
                true
            }
            None => {
                debug!(path = %self.path.display(), "Interaction vetoed by a response hook");
                false
            }
        }
    }

    /// Filters in effect for this recorder.
    #[must_use]
    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    /// Cassette the recorder writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interactions kept so far.
    #[must_use]
    pub fn interactions(&self) -> &[I] {
        &self.interactions
    }

    /// Writes the cassette. Later calls do nothing and return `Ok(None)`.
    ///
    /// Returns the written path, or `None` when the cassette was skipped
    /// because it was empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(&mut self) -> Result<Option<PathBuf>, RecorderError> {
        if std::mem::replace(&mut self.finished, true) {
            return Ok(None);
        }
        if self.interactions.is_empty() && self.policy == SavePolicy::SkipEmpty {
            debug!(path = %self.path.display(), "Nothing recorded, cassette not written");
            return Ok(None);
        }
        let cassette = Cassette::new(std::mem::take(&mut self.interactions));
        store::save(&self.path, &cassette)?;
        Ok(Some(self.path.clone()))
    }
}
