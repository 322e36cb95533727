//! `tapedeck path` command.

use crate::cli::TestArgs;

/// Execute the `path` command.
///
/// # Errors
///
/// Never fails; the signature matches the other handlers.
pub fn run(target: &TestArgs, no_hash: bool) -> Result<(), String> {
    let path = crate::cassette::path::resolve(&target.module, &target.test, target.kind, !no_hash);
    println!("{}", path.display());
    Ok(())
}
