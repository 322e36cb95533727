//! Cassette engine: paths, modes, on-disk format, recording and replay.

pub mod config;
pub mod format;
pub mod mode;
pub mod path;
pub mod recorder;
pub mod replayer;
pub mod session;
pub mod store;
