//! Recording adapters that capture interactions to cassettes.
//!
//! Each adapter delegates to the wrapped implementation, hands the caller the
//! unchanged result, and appends what it saw to the session's recorder.

pub mod easy;
pub mod ftp;
pub mod http;

pub use easy::RecordingEasyTransfer;
pub use ftp::{RecordingFtpClient, RecordingUrlOpener};
pub use http::{RecordingAsyncHttpTransport, RecordingHttpTransport};

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::lock;
use crate::cassette::recorder::CassetteRecorder;
use crate::normalize::{normalize, RequestSource};

/// Normalizes a completed exchange and records it if its status is in range.
pub(crate) fn record_exchange(recorder: &Arc<Mutex<CassetteRecorder>>, source: RequestSource<'_>) {
    let interaction = normalize(source);
    let mut recorder = lock(recorder);
    let status = interaction.response.status.code;
    if !recorder.filters().record_status.contains(status) {
        debug!(uri = %interaction.request.uri, status, "Status outside recorded range, skipping");
        return;
    }
    recorder.record(interaction);
}
