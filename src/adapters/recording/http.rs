//! Recording adapters for the HTTP transport ports.

use std::sync::{Arc, Mutex};

use super::record_exchange;
use crate::cassette::format::SourceType;
use crate::cassette::recorder::CassetteRecorder;
use crate::normalize::RequestSource;
use crate::ports::http::{
    AsyncHttpTransport, HttpFuture, HttpRequest, HttpResponse, HttpTransport, TransportError,
};

/// Records blocking HTTP exchanges while delegating to an inner transport.
pub struct RecordingHttpTransport {
    inner: Box<dyn HttpTransport>,
    recorder: Arc<Mutex<CassetteRecorder>>,
    source_type: SourceType,
}

impl RecordingHttpTransport {
    /// Creates a recording transport; `source_type` tags every interaction.
    pub fn new(
        inner: Box<dyn HttpTransport>,
        recorder: Arc<Mutex<CassetteRecorder>>,
        source_type: SourceType,
    ) -> Self {
        Self { inner, recorder, source_type }
    }
}

impl HttpTransport for RecordingHttpTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = self.inner.send(request.clone());
        if let Ok(response) = &result {
            record_exchange(
                &self.recorder,
                RequestSource::exchange(self.source_type, &request, response),
            );
        }
        result
    }
}

/// Records awaitable HTTP exchanges once the inner future resolves.
pub struct RecordingAsyncHttpTransport {
    inner: Box<dyn AsyncHttpTransport>,
    recorder: Arc<Mutex<CassetteRecorder>>,
    source_type: SourceType,
}

impl RecordingAsyncHttpTransport {
    /// Creates a recording transport; `source_type` tags every interaction.
    pub fn new(
        inner: Box<dyn AsyncHttpTransport>,
        recorder: Arc<Mutex<CassetteRecorder>>,
        source_type: SourceType,
    ) -> Self {
        Self { inner, recorder, source_type }
    }
}

impl AsyncHttpTransport for RecordingAsyncHttpTransport {
    fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
        Box::pin(async move {
            let result = self.inner.send(request.clone()).await;
            if let Ok(response) = &result {
                record_exchange(
                    &self.recorder,
                    RequestSource::exchange(self.source_type, &request, response),
                );
            }
            result
        })
    }
}
