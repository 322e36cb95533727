//! Recording adapter for the easy-handle port.

use std::sync::{Arc, Mutex};

use super::record_exchange;
use crate::adapters::lock;
use crate::cassette::recorder::CassetteRecorder;
use crate::normalize::{EasyCapture, RequestSource};
use crate::ports::easy::{DataCallback, EasyOption, EasyTransfer, Sink};
use crate::ports::http::TransportError;

/// Records easy-handle transfers.
///
/// The caller's body and header sinks are held here; at `perform` time the
/// inner handle gets sinks that copy every byte to the capture buffers and
/// pass it on to the caller's sink.
pub struct RecordingEasyTransfer {
    inner: Box<dyn EasyTransfer>,
    recorder: Arc<Mutex<CassetteRecorder>>,
    request: EasyCapture,
    write_sink: Arc<Mutex<Option<Sink>>>,
    header_sink: Arc<Mutex<Option<Sink>>>,
}

impl RecordingEasyTransfer {
    /// Creates a recording handle over `inner`.
    pub fn new(inner: Box<dyn EasyTransfer>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self {
            inner,
            recorder,
            request: fresh_request(),
            write_sink: Arc::default(),
            header_sink: Arc::default(),
        }
    }
}

fn fresh_request() -> EasyCapture {
    EasyCapture { method: "GET".into(), ..EasyCapture::default() }
}

/// A sink that appends to `buffer` and forwards to the caller's sink, if any.
fn tee(buffer: &Arc<Mutex<Vec<u8>>>, user: &Arc<Mutex<Option<Sink>>>) -> DataCallback {
    let buffer = Arc::clone(buffer);
    let user = Arc::clone(user);
    let callback = move |data: &[u8]| {
        lock(&buffer).extend_from_slice(data);
        match lock(&user).as_mut() {
            Some(sink) => sink.deliver(data),
            None => data.len(),
        }
    };
    Box::new(callback)
}

impl EasyTransfer for RecordingEasyTransfer {
    fn setopt(&mut self, option: EasyOption) -> Result<(), TransportError> {
        match option {
            EasyOption::Url(url) => {
                self.request.url.clone_from(&url);
                self.inner.setopt(EasyOption::Url(url))
            }
            EasyOption::CustomRequest(method) => {
                self.request.method.clone_from(&method);
                self.inner.setopt(EasyOption::CustomRequest(method))
            }
            EasyOption::HttpHeader(lines) => {
                for line in &lines {
                    if let Some((name, value)) = line.split_once(':') {
                        self.request
                            .request_headers
                            .insert(name.trim().to_string(), value.trim().to_string());
                    }
                }
                self.inner.setopt(EasyOption::HttpHeader(lines))
            }
            EasyOption::PostFields(body) => {
                self.request.post_fields = Some(body.clone());
                if self.request.method == "GET" {
                    self.request.method = "POST".into();
                }
                self.inner.setopt(EasyOption::PostFields(body))
            }
            EasyOption::WriteFunction(callback) => {
                *lock(&self.write_sink) = Some(Sink::Callback(callback));
                Ok(())
            }
            EasyOption::WriteData(writer) => {
                *lock(&self.write_sink) = Some(Sink::Writer(writer));
                Ok(())
            }
            EasyOption::HeaderFunction(callback) => {
                *lock(&self.header_sink) = Some(Sink::Callback(callback));
                Ok(())
            }
        }
    }

    fn perform(&mut self) -> Result<(), TransportError> {
        let body = Arc::new(Mutex::new(Vec::new()));
        let headers = Arc::new(Mutex::new(Vec::new()));
        self.inner.setopt(EasyOption::WriteFunction(tee(&body, &self.write_sink)))?;
        self.inner.setopt(EasyOption::HeaderFunction(tee(&headers, &self.header_sink)))?;

        self.inner.perform()?;

        let mut capture = self.request.clone();
        capture.status = self.inner.response_code();
        capture.body = std::mem::take(&mut *lock(&body));
        capture.raw_headers = std::mem::take(&mut *lock(&headers));
        record_exchange(&self.recorder, RequestSource::CurlEasy(&capture));
        Ok(())
    }

    fn response_code(&self) -> u16 {
        self.inner.response_code()
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.request = fresh_request();
        *lock(&self.write_sink) = None;
        *lock(&self.header_sink) = None;
    }
}
