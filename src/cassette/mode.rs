//! Decides whether a session captures, replays, or cannot run.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::RecorderError;
use crate::kind::{RecordKind, RequestedKinds};

/// What a marked session does for the rest of the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordMode {
    /// Run live and persist what happened.
    Capture,
    /// Serve calls from the stored cassette and verify against it.
    Replay,
    /// No recording requested and nothing stored.
    Unavailable,
}

/// Picks the mode for one session.
///
/// Capture wins whenever the kind was requested, unless a cassette already
/// exists and overwriting is forbidden. Otherwise an existing cassette is
/// replayed. There is no fallback beyond that.
#[must_use]
pub fn decide(
    requested: &RequestedKinds,
    kind: RecordKind,
    cassette_exists: bool,
    no_overwrite: bool,
) -> RecordMode {
    if requested.includes(kind) && !(cassette_exists && no_overwrite) {
        RecordMode::Capture
    } else if cassette_exists {
        RecordMode::Replay
    } else {
        RecordMode::Unavailable
    }
}

/// Removes a stale cassette so nothing from a previous recording leaks into
/// a fresh capture.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn prepare_capture(path: &Path) -> Result<(), RecorderError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale cassette before capture");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(RecorderError::Io { path: path.to_path_buf(), source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested(flag: bool) -> RequestedKinds {
        if flag {
            RequestedKinds::parse("curl").unwrap()
        } else {
            RequestedKinds::none()
        }
    }

    #[test]
    fn every_combination_of_requested_exists_and_no_overwrite() {
        use RecordMode::{Capture, Replay, Unavailable};

        // (requested, exists, no_overwrite) -> mode
        let table = [
            (false, false, false, Unavailable),
            (false, false, true, Unavailable),
            (false, true, false, Replay),
            (false, true, true, Replay),
            (true, false, false, Capture),
            (true, false, true, Capture),
            (true, true, false, Capture),
            (true, true, true, Replay),
        ];

        for (req, exists, no_overwrite, expected) in table {
            let mode = decide(&requested(req), RecordKind::Curl, exists, no_overwrite);
            assert_eq!(
                mode, expected,
                "requested={req} exists={exists} no_overwrite={no_overwrite}"
            );
        }
    }

    #[test]
    fn all_requests_capture_of_any_kind() {
        let all = RequestedKinds::parse("all").unwrap();
        assert_eq!(decide(&all, RecordKind::Time, false, false), RecordMode::Capture);
    }

    #[test]
    fn other_kind_requested_does_not_capture() {
        let http = RequestedKinds::parse("http").unwrap();
        assert_eq!(decide(&http, RecordKind::Ftp, true, false), RecordMode::Replay);
        assert_eq!(decide(&http, RecordKind::Ftp, false, false), RecordMode::Unavailable);
    }

    #[test]
    fn prepare_capture_removes_existing_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.yaml");
        std::fs::write(&path, "interactions: []").unwrap();

        prepare_capture(&path).unwrap();
        assert!(!path.exists());
        prepare_capture(&path).unwrap();
    }
}
