//! Record external interactions once, replay and verify them on every later
//! test run.
//!
//! A test opts into record kinds with markers on its [`TestId`]. A
//! [`Recorder`] then opens one session per kind: HTTP and cURL transports,
//! FTP clients and `ftp://` downloads, time travel, object verification and
//! screen output. Whether a session captures or replays is decided from the
//! run's [`RecordOptions`] and what is already on disk.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod filter;
pub mod kind;
pub mod normalize;
pub mod options;
pub mod ports;
pub mod screen;
pub mod time;
pub mod verify;

pub use cassette::config::FilterSpec;
pub use cassette::mode::RecordMode;
pub use cassette::path::TestId;
pub use cassette::session::{FtpSession, HttpSession};
pub use context::Recorder;
pub use error::RecorderError;
pub use filter::{HookOutcome, ResponsePatch};
pub use kind::RecordKind;
pub use options::RecordOptions;
pub use screen::ScreenRecord;
pub use time::{TimeTravel, TravelClock, TravelSpec};
pub use verify::ObjectRecord;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
