//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::kind::RecordKind;
use crate::options::RecordOptions;

/// Top-level CLI parser for `tapedeck`.
#[derive(Debug, Parser)]
#[command(name = "tapedeck", version, about = "Inspect record/replay cassettes")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// A test and the record kind being asked about.
#[derive(Debug, Clone, Args)]
pub struct TestArgs {
    /// Source file of the test, e.g. `tests/net.rs`.
    pub module: PathBuf,
    /// Name of the test function.
    pub test: String,
    /// Record kind.
    #[arg(long, value_enum)]
    pub kind: RecordKind,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print where a test's record of a kind lives.
    Path {
        /// Test to resolve.
        #[command(flatten)]
        target: TestArgs,
        /// Resolve the unhashed object/screen folder.
        #[arg(long = "record-no-hash")]
        no_hash: bool,
    },
    /// Print the mode a marked test would run in.
    Mode {
        /// Test to decide for.
        #[command(flatten)]
        target: TestArgs,
        /// Recording switches of the run.
        #[command(flatten)]
        options: RecordOptions,
    },
    /// Summarize a cassette or record file.
    Show {
        /// File to summarize.
        cassette: PathBuf,
    },
}
