//! Error types for recording, replaying and verifying cassettes.
//!
//! Every fatal condition names the cassette file it concerns so a failing
//! test can be diagnosed without re-running it.

use std::path::PathBuf;

use thiserror::Error;

use crate::kind::RecordKind;

/// Errors raised by the cassette engine.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Neither a recording was requested nor does a cassette exist.
    #[error(
        "No comparison possible since there is no {kind} cassette: {} \
         (run with --record {kind} to create it)",
        .path.display()
    )]
    Unavailable {
        /// Record kind of the session.
        kind: RecordKind,
        /// Resolved cassette path.
        path: PathBuf,
    },

    /// Replay found no stored interaction for a live call.
    #[error(
        "Cassette {} has no interaction matching {criteria} \
         ({total} stored, {used} already consumed)",
        .path.display()
    )]
    NoMatchingInteraction {
        /// Cassette being replayed.
        path: PathBuf,
        /// Human-readable match criteria (URI, or FTP command and arguments).
        criteria: String,
        /// Number of interactions in the cassette.
        total: usize,
        /// Number of interactions already consumed.
        used: usize,
    },

    /// The current run produced a different number of values than stored.
    #[error(
        "Record have different number of objects:\n\
         \nRECORD_FILE_PATH =\n{}\n\
         \nCURRENT_OBJECT_LIST = {current}\n\
         \nLOADED_OBJECT_LIST  = {loaded}\n",
        .path.display()
    )]
    LengthMismatch {
        /// Verification record path.
        path: PathBuf,
        /// Number of values collected by the current run.
        current: usize,
        /// Number of values in the stored record.
        loaded: usize,
    },

    /// A collected value differs from the stored one at the same position.
    #[error(
        "Record's data have changed.\n\
         \nRECORD_FILE_PATH =\n{}\n\
         \nINDEX = {index}\n\
         \nCURRENT =\n{current}\n\
         \nPREVIOUS =\n{previous}\n",
        .path.display()
    )]
    ValueMismatch {
        /// Verification record path.
        path: PathBuf,
        /// Position of the first differing value.
        index: usize,
        /// Value produced by the current run.
        current: String,
        /// Value found in the stored record.
        previous: String,
    },

    /// A cassette was loaded from a path that does not exist.
    #[error("Cannot load record file: {}", .path.display())]
    CassetteNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// Filesystem failure while reading or writing a cassette.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A YAML cassette could not be parsed or written.
    #[error("Invalid YAML cassette {}: {source}", .path.display())]
    Yaml {
        /// Cassette path.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },

    /// A JSON record could not be parsed or written.
    #[error("Invalid JSON record {}: {source}", .path.display())]
    Json {
        /// Record path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A stored body declared base64 but does not decode.
    #[error("Invalid {encoding} body in cassette: {reason}")]
    InvalidBody {
        /// Declared encoding.
        encoding: String,
        /// Decoder message.
        reason: String,
    },

    /// A value handed to the verifier could not be serialized.
    #[error("Cannot serialize value for verification: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A record kind name outside the registry.
    #[error("Unknown record kind `{0}` (expected one of: none, all, curl, ftp, http, object, screen, time)")]
    UnknownKind(String),
}

/// Result alias for cassette engine operations.
pub type Result<T> = std::result::Result<T, RecorderError>;
