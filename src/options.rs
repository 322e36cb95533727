//! Run-wide recording options.
//!
//! The same three switches drive every session: which kinds to record, whether
//! existing cassettes may be overwritten, and whether verification records are
//! hashed. The CLI parses them with clap; test code reads them from the
//! environment (after loading a `.env` file, if one exists).

use clap::Args;

use crate::error::RecorderError;
use crate::kind::{RecordKind, RequestedKinds};

/// Environment variable holding the comma separated kinds to record.
pub const RECORD_ENV: &str = "TAPEDECK_RECORD";
/// Environment variable that forbids overwriting existing cassettes.
pub const NO_OVERWRITE_ENV: &str = "TAPEDECK_RECORD_NO_OVERWRITE";
/// Environment variable that stores verification values without hashing.
pub const NO_HASH_ENV: &str = "TAPEDECK_RECORD_NO_HASH";

/// Options shared by every session of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RecordOptions {
    /// Records the listed kinds (default: none).
    #[arg(long = "record", value_enum, value_delimiter = ',', default_value = "none")]
    pub record: Vec<RecordKind>,
    /// Avoid rewriting existing records; applies to every kind.
    #[arg(long = "record-no-overwrite")]
    pub no_overwrite: bool,
    /// Store object and screen records without hashing them first.
    #[arg(long = "record-no-hash")]
    pub no_hash: bool,
}

impl RecordOptions {
    /// Options that record the given kinds and allow overwriting.
    #[must_use]
    pub fn recording(kinds: &[RecordKind]) -> Self {
        Self { record: kinds.to_vec(), ..Self::default() }
    }

    /// Reads options from the process environment, loading `.env` first.
    ///
    /// # Errors
    ///
    /// Returns an error if `TAPEDECK_RECORD` names an unknown kind.
    pub fn from_env() -> Result<Self, RecorderError> {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads options through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the record variable names an unknown kind.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RecorderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let record = match lookup(RECORD_ENV) {
            Some(list) => RequestedKinds::parse(&list)?.kinds(),
            None => Vec::new(),
        };
        Ok(Self {
            record,
            no_overwrite: lookup(NO_OVERWRITE_ENV).is_some_and(|v| is_truthy(&v)),
            no_hash: lookup(NO_HASH_ENV).is_some_and(|v| is_truthy(&v)),
        })
    }

    /// The requested kinds as a set.
    #[must_use]
    pub fn requested(&self) -> RequestedKinds {
        self.record.iter().copied().collect()
    }

    /// Whether verification records are stored as digests.
    #[must_use]
    pub fn hash_only(&self) -> bool {
        !self.no_hash
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
