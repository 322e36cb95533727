//! Replaying adapters for the HTTP transport ports.

use std::sync::{Arc, Mutex};

use super::replay_response;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::http::{
    AsyncHttpTransport, HttpFuture, HttpRequest, HttpResponse, HttpTransport, TransportError,
};

/// Answers blocking HTTP calls from a cassette.
pub struct ReplayingHttpTransport {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingHttpTransport {
    /// Creates a replaying transport.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl HttpTransport for ReplayingHttpTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (_, response) = replay_response(&self.replayer, &request.url)?;
        Ok(response)
    }
}

/// Answers awaitable HTTP calls from a cassette. The future is ready at once.
pub struct ReplayingAsyncHttpTransport {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingAsyncHttpTransport {
    /// Creates a replaying transport.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl AsyncHttpTransport for ReplayingAsyncHttpTransport {
    fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
        let result = replay_response(&self.replayer, &request.url)
            .map(|(_, response)| response)
            .map_err(TransportError::from);
        Box::pin(std::future::ready(result))
    }
}
