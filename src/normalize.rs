//! Converts every transport's view of an exchange into one [`Interaction`].

use crate::cassette::format::{Body, Headers, Interaction, Request, Response, SourceType, Status};
use crate::ports::http::{HttpRequest, HttpResponse};

/// A completed exchange as seen by one of the capture decorators.
#[derive(Debug, Clone, Copy)]
pub enum RequestSource<'a> {
    /// A plain [`HttpTransport`](crate::ports::HttpTransport) call.
    Http {
        /// Request sent.
        request: &'a HttpRequest,
        /// Response received.
        response: &'a HttpResponse,
    },
    /// A blocking cURL-style session call.
    CurlSession {
        /// Request sent.
        request: &'a HttpRequest,
        /// Response received.
        response: &'a HttpResponse,
    },
    /// An awaitable cURL-style session call.
    CurlAsync {
        /// Request sent.
        request: &'a HttpRequest,
        /// Response received.
        response: &'a HttpResponse,
    },
    /// A transfer on a low-level easy handle.
    CurlEasy(&'a EasyCapture),
}

impl<'a> RequestSource<'a> {
    /// Wraps a request/response pair under the variant matching `source_type`.
    /// Easy-handle transfers never arrive as pairs and are tagged `Http`.
    #[must_use]
    pub fn exchange(
        source_type: SourceType,
        request: &'a HttpRequest,
        response: &'a HttpResponse,
    ) -> Self {
        match source_type {
            SourceType::CurlSession => RequestSource::CurlSession { request, response },
            SourceType::CurlAsync => RequestSource::CurlAsync { request, response },
            SourceType::Http | SourceType::CurlEasy => RequestSource::Http { request, response },
        }
    }
}

/// What a recording easy handle saw during one `perform`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EasyCapture {
    /// Effective method.
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Request headers parsed from `Name: value` lines.
    pub request_headers: Headers,
    /// Posted body.
    pub post_fields: Option<Vec<u8>>,
    /// Response code reported by the handle.
    pub status: u16,
    /// Raw header bytes, status line included.
    pub raw_headers: Vec<u8>,
    /// Body bytes.
    pub body: Vec<u8>,
}

/// Produces the canonical interaction for `source`.
///
/// Response bodies are always kept; which statuses reach the cassette is
/// decided later by the recorder's `record_status` range. Easy-handle status
/// messages are `OK` for 200 and `Error` otherwise.
#[must_use]
pub fn normalize(source: RequestSource<'_>) -> Interaction {
    match source {
        RequestSource::Http { request, response } => {
            from_exchange(request, response, SourceType::Http)
        }
        RequestSource::CurlSession { request, response } => {
            from_exchange(request, response, SourceType::CurlSession)
        }
        RequestSource::CurlAsync { request, response } => {
            from_exchange(request, response, SourceType::CurlAsync)
        }
        RequestSource::CurlEasy(capture) => Interaction {
            request: Request {
                method: capture.method.clone(),
                uri: capture.url.clone(),
                headers: capture.request_headers.clone(),
                body: capture.post_fields.as_deref().map(Body::from_bytes),
            },
            response: Response {
                status: Status {
                    code: capture.status,
                    message: if capture.status == 200 { "OK" } else { "Error" }.to_string(),
                },
                headers: parse_header_lines(&capture.raw_headers),
                body: Body::from_bytes(&capture.body),
            },
            source_type: SourceType::CurlEasy,
        },
    }
}

fn from_exchange(
    request: &HttpRequest,
    response: &HttpResponse,
    source_type: SourceType,
) -> Interaction {
    Interaction {
        request: Request {
            method: request.method.clone(),
            uri: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.as_deref().map(Body::from_bytes),
        },
        response: Response {
            status: Status { code: response.status, message: response.reason.clone() },
            headers: response.headers.clone(),
            body: Body::from_bytes(&response.body),
        },
        source_type,
    }
}

/// Parses `Name: value` lines; status lines and blank lines are skipped.
#[must_use]
pub fn parse_header_lines(raw: &[u8]) -> Headers {
    String::from_utf8_lossy(raw)
        .split("\r\n")
        .flat_map(|chunk| chunk.split('\n'))
        .filter_map(|line| line.split_once(':'))
        .filter(|(name, _)| !name.trim().is_empty() && !name.starts_with("HTTP/"))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Serializes a status line and headers the way a server sends them.
#[must_use]
pub fn header_block(status: &Status, headers: &Headers) -> Vec<u8> {
    let mut block = format!("HTTP/1.1 {} {}\r\n", status.code, status.message);
    for (name, value) in headers {
        block.push_str(name);
        block.push_str(": ");
        block.push_str(value);
        block.push_str("\r\n");
    }
    block.push_str("\r\n");
    block.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(status: u16) -> (HttpRequest, HttpResponse) {
        let request = HttpRequest::new("GET", "https://h.test/a?apikey=1").header("Accept", "*/*");
        let response = HttpResponse {
            status,
            reason: if status == 200 { "OK" } else { "Not Found" }.into(),
            headers: Headers::new(),
            body: b"payload".to_vec(),
            url: request.url.clone(),
        };
        (request, response)
    }

    #[test]
    fn http_keeps_every_body() {
        let (request, response) = pair(404);
        let interaction = normalize(RequestSource::Http { request: &request, response: &response });
        assert_eq!(interaction.source_type, SourceType::Http);
        assert_eq!(interaction.response.body.string.as_deref(), Some("payload"));
        assert_eq!(interaction.response.status.message, "Not Found");
    }

    #[test]
    fn curl_sessions_keep_body_for_any_status() {
        let (request, response) = pair(200);
        let ok = normalize(RequestSource::exchange(SourceType::CurlSession, &request, &response));
        assert_eq!(ok.response.body.string.as_deref(), Some("payload"));
        assert_eq!(ok.request.headers["Accept"], "*/*");

        let (request, response) = pair(201);
        let created = normalize(RequestSource::exchange(SourceType::CurlSession, &request, &response));
        assert_eq!(created.response.body.string.as_deref(), Some("payload"));

        let (request, response) = pair(404);
        let missing = normalize(RequestSource::exchange(SourceType::CurlAsync, &request, &response));
        assert_eq!(missing.response.body.string.as_deref(), Some("payload"));
        assert_eq!(missing.source_type, SourceType::CurlAsync);
    }

    #[test]
    fn easy_capture_parses_raw_headers() {
        let capture = EasyCapture {
            method: "POST".into(),
            url: "https://h.test/submit".into(),
            request_headers: Headers::new(),
            post_fields: Some(b"a=1".to_vec()),
            status: 201,
            raw_headers: b"HTTP/1.1 201 Created\r\nContent-Type: text/plain\r\nX-Id:  7 \r\n\r\n".to_vec(),
            body: b"done".to_vec(),
        };
        let interaction = normalize(RequestSource::CurlEasy(&capture));
        assert_eq!(interaction.response.status.message, "Error");
        assert_eq!(interaction.response.headers["Content-Type"], "text/plain");
        assert_eq!(interaction.response.headers["X-Id"], "7");
        assert_eq!(interaction.response.headers.len(), 2);
        assert_eq!(interaction.request.body, Some(Body::text("a=1")));
    }

    #[test]
    fn header_block_parses_back() {
        let mut headers = Headers::new();
        headers.insert("Content-Length".into(), "4".into());
        let block = header_block(&Status { code: 200, message: "OK".into() }, &headers);
        assert!(block.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert_eq!(parse_header_lines(&block), headers);
    }
}
