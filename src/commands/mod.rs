//! Command dispatch and handlers.

pub mod mode;
pub mod path;
pub mod show;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Path { target, no_hash } => path::run(target, *no_hash),
        Command::Mode { target, options } => mode::run(target, options),
        Command::Show { cassette } => show::run(cassette),
    }
}
