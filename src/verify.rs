//! Verification records for values with no live transport.
//!
//! A run collects an ordered list of strings. Capture stores the list; a later
//! run compares its own list against the stored one position by position.
//! With hashing on (the default) only SHA-256 digests are stored.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cassette::mode::RecordMode;
use crate::cassette::path::TestId;
use crate::cassette::session::{activate, fail_on_drop};
use crate::cassette::store;
use crate::error::RecorderError;
use crate::kind::RecordKind;
use crate::options::RecordOptions;

/// Collects values and checks them against the stored record on finish.
#[derive(Debug)]
pub(crate) struct Verifier {
    kind: RecordKind,
    path: PathBuf,
    mode: Option<RecordMode>,
    hash_only: bool,
    values: Vec<String>,
    finished: bool,
}

impl Verifier {
    pub(crate) fn open(
        test: &TestId,
        options: &RecordOptions,
        kind: RecordKind,
    ) -> Result<Self, RecorderError> {
        let (path, mode) = activate(test, options, kind)?;
        Ok(Self {
            kind,
            path,
            mode,
            hash_only: options.hash_only(),
            values: Vec::new(),
            finished: false,
        })
    }

    pub(crate) fn mode(&self) -> Option<RecordMode> {
        self.mode
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    pub(crate) fn push(&mut self, text: &str) {
        if !self.is_active() {
            return;
        }
        let value = if self.hash_only { digest(text) } else { text.to_string() };
        self.values.push(value);
    }

    pub(crate) fn finish(&mut self) -> Result<(), RecorderError> {
        if std::mem::replace(&mut self.finished, true) {
            return Ok(());
        }
        match self.mode {
            None => Ok(()),
            Some(RecordMode::Capture) => {
                debug!(path = %self.path.display(), count = self.values.len(), "Saving verification record");
                store::save(&self.path, &self.values)
            }
            Some(_) => {
                let loaded: Vec<String> = store::load(&self.path)?;
                compare(&self.path, &self.values, &loaded)
            }
        }
    }
}

impl Drop for Verifier {
    fn drop(&mut self) {
        let result = self.finish();
        fail_on_drop(self.kind, &self.path, result);
    }
}

/// SHA-256 of `text` as lowercase hex.
#[must_use]
pub fn digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Serializes `value` as JSON with object keys sorted.
///
/// # Errors
///
/// Returns [`RecorderError::Serialize`] if the value cannot be represented
/// as JSON.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RecorderError> {
    // serde_json::Value keeps object keys in a BTreeMap.
    let tree = serde_json::to_value(value).map_err(RecorderError::Serialize)?;
    serde_json::to_string(&tree).map_err(RecorderError::Serialize)
}

/// Compares a fresh list against a stored one.
///
/// # Errors
///
/// Returns [`RecorderError::LengthMismatch`] when the lists differ in
/// length, otherwise [`RecorderError::ValueMismatch`] at the first differing
/// position.
pub fn compare(path: &Path, current: &[String], loaded: &[String]) -> Result<(), RecorderError> {
    if current.len() != loaded.len() {
        return Err(RecorderError::LengthMismatch {
            path: path.to_path_buf(),
            current: current.len(),
            loaded: loaded.len(),
        });
    }
    match current.iter().zip(loaded).position(|(c, l)| c != l) {
        Some(index) => Err(RecorderError::ValueMismatch {
            path: path.to_path_buf(),
            index,
            current: current[index].clone(),
            previous: loaded[index].clone(),
        }),
        None => Ok(()),
    }
}

/// Object verification for one test. Needs no marker.
///
/// Values added with [`ObjectRecord::add_verify`] are saved on capture and
/// compared on every later run. The comparison happens in
/// [`ObjectRecord::finish`] or, failing that, when the record is dropped.
#[derive(Debug)]
pub struct ObjectRecord {
    verifier: Verifier,
}

impl ObjectRecord {
    /// Opens the object record of `test`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Unavailable`] if nothing is stored and object
    /// recording was not requested.
    pub fn open(test: &TestId, options: &RecordOptions) -> Result<Self, RecorderError> {
        Ok(Self { verifier: Verifier::open(test, options, RecordKind::Object)? })
    }

    /// Adds a value to verify.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized as JSON.
    pub fn add_verify<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RecorderError> {
        let json = canonical_json(value)?;
        self.verifier.push(&json);
        Ok(())
    }

    /// Decided mode.
    #[must_use]
    pub fn mode(&self) -> Option<RecordMode> {
        self.verifier.mode()
    }

    /// Record path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.verifier.path()
    }

    /// Saves or verifies the collected values.
    ///
    /// # Errors
    ///
    /// Returns a mismatch error when verification fails, or an I/O or parse
    /// error for the record file.
    pub fn finish(mut self) -> Result<(), RecorderError> {
        self.verifier.finish()
    }
}
