//! HTTP transport ports, blocking and awaitable.

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::cassette::format::Headers;
use crate::error::RecorderError;

/// Errors surfaced by HTTP-family transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The live client failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a status outside 2xx.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// A response body was not the expected JSON.
    #[error("Invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
    /// Replay could not serve the call.
    #[error(transparent)]
    Replay(#[from] RecorderError),
    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Boxed future type alias used by [`AsyncHttpTransport`] to keep the trait dyn-compatible.
pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method, upper case.
    pub method: String,
    /// Absolute URL including the query.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A request without headers or body.
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub reason: String,
    /// Response headers.
    pub headers: Headers,
    /// Raw body.
    pub body: Vec<u8>,
    /// URL the response came from.
    pub url: String,
}

impl HttpResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// True for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns a non-2xx response into an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] when the status is outside 2xx.
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status { status: self.status, url: self.url })
        }
    }
}

/// Sends blocking HTTP requests.
pub trait HttpTransport: Send + Sync {
    /// Sends the request and waits for the full response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be completed or replayed.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// `GET url`.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new("GET", url))
    }

    /// `POST url` with a body.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new("POST", url).body(body))
    }

    /// `PUT url` with a body.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    fn put(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new("PUT", url).body(body))
    }

    /// `PATCH url` with a body.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    fn patch(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new("PATCH", url).body(body))
    }

    /// `DELETE url`.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    fn delete(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new("DELETE", url))
    }

    /// `HEAD url`.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new("HEAD", url))
    }

    /// `OPTIONS url`.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    fn options(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new("OPTIONS", url))
    }
}

/// Sends HTTP requests without blocking the caller.
pub trait AsyncHttpTransport: Send + Sync {
    /// Sends the request; the future resolves to the full response.
    fn send(&self, request: HttpRequest) -> HttpFuture<'_>;

    /// `GET url`.
    fn get(&self, url: &str) -> HttpFuture<'_> {
        self.send(HttpRequest::new("GET", url))
    }

    /// `POST url` with a body.
    fn post(&self, url: &str, body: Vec<u8>) -> HttpFuture<'_> {
        self.send(HttpRequest::new("POST", url).body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: Headers::new(),
            body: body.as_bytes().to_vec(),
            url: "https://h.test/".into(),
        }
    }

    #[test]
    fn request_builder_normalizes_method() {
        let request = HttpRequest::new("post", "https://h.test/").header("A", "1").body("x");
        assert_eq!(request.method, "POST");
        assert_eq!(request.headers["A"], "1");
        assert_eq!(request.body.as_deref(), Some(&b"x"[..]));
    }

    #[test]
    fn json_and_status_helpers() {
        let ok = response(200, r#"{"n": 3}"#);
        let value: serde_json::Value = ok.json().unwrap();
        assert_eq!(value["n"], 3);
        assert!(ok.error_for_status().is_ok());

        let missing = response(404, "");
        assert!(matches!(
            missing.error_for_status(),
            Err(TransportError::Status { status: 404, .. })
        ));
    }
}
