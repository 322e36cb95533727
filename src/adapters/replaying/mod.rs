//! Replaying adapters that replay recorded interactions.

pub mod easy;
pub mod ftp;
pub mod http;

pub use easy::ReplayingEasyTransfer;
pub use ftp::{ReplayingFtpClient, ReplayingUrlOpener};
pub use http::{ReplayingAsyncHttpTransport, ReplayingHttpTransport};

use std::sync::{Arc, Mutex};

use super::lock;
use crate::cassette::format::Interaction;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::RecorderError;
use crate::ports::http::HttpResponse;

/// Looks up the interaction for `uri` and rebuilds the response it stored.
pub(crate) fn replay_response(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    uri: &str,
) -> Result<(Interaction, HttpResponse), RecorderError> {
    let interaction = lock(replayer).next_match(uri)?;
    let response = HttpResponse {
        status: interaction.response.status.code,
        reason: interaction.response.status.message.clone(),
        headers: interaction.response.headers.clone(),
        body: interaction.response.body.to_bytes()?,
        url: uri.to_string(),
    };
    Ok((interaction, response))
}
