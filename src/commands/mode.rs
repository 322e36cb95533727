//! `tapedeck mode` command.

use crate::cassette::mode::RecordMode;
use crate::cassette::path::TestId;
use crate::cli::TestArgs;
use crate::context::Recorder;
use crate::options::RecordOptions;

/// Execute the `mode` command. The test is assumed to carry the marker for
/// the requested kind.
///
/// # Errors
///
/// Never fails; an unavailable record is reported, not raised.
pub fn run(target: &TestArgs, options: &RecordOptions) -> Result<(), String> {
    println!("{}", describe(target, options));
    Ok(())
}

/// One line naming the decided mode and the record path.
#[must_use]
pub fn describe(target: &TestArgs, options: &RecordOptions) -> String {
    let test = TestId::new(target.module.clone(), target.test.clone()).with_marker(target.kind);
    let recorder = Recorder::new(options.clone(), test);
    let label = match recorder.mode(target.kind) {
        Some(RecordMode::Capture) => "capture",
        Some(RecordMode::Replay) => "replay",
        Some(RecordMode::Unavailable) | None => "unavailable",
    };
    format!("{label} {}", recorder.cassette_path(target.kind).display())
}
