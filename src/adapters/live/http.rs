//! Live HTTP transports backed by reqwest.

use reqwest::header::HeaderMap;
use reqwest::Method;

use crate::cassette::format::Headers;
use crate::ports::http::{
    AsyncHttpTransport, HttpFuture, HttpRequest, HttpResponse, HttpTransport, TransportError,
};

/// Blocking transport using `reqwest::blocking`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around a configured client.
    #[must_use]
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(method(&request)?, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let url = response.url().to_string();
        let headers = convert_headers(response.headers());
        let body = response.bytes()?.to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            url,
        })
    }
}

/// Awaitable transport using the async `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestAsyncTransport {
    client: reqwest::Client,
}

impl ReqwestAsyncTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(method(&request)?, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let headers = convert_headers(response.headers());
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            url,
        })
    }
}

impl AsyncHttpTransport for ReqwestAsyncTransport {
    fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
        Box::pin(self.execute(request))
    }
}

fn method(request: &HttpRequest) -> Result<Method, TransportError> {
    Method::from_bytes(request.method.as_bytes())
        .map_err(|e| TransportError::Other(format!("Invalid method {}: {e}", request.method)))
}

/// Header values that are not visible ASCII are dropped.
pub(crate) fn convert_headers(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    use super::*;

    #[test]
    fn rejects_malformed_method() {
        let request = HttpRequest::new("BAD METHOD", "https://h.test/");
        assert!(matches!(method(&request), Err(TransportError::Other(_))));
        assert_eq!(method(&HttpRequest::new("get", "https://h.test/")).unwrap(), Method::GET);
    }

    #[test]
    fn header_names_are_kept_lowercase() {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let headers = convert_headers(&map);
        assert_eq!(headers["content-type"], "text/plain");
    }
}
