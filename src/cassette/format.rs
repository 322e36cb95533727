//! Cassette data structures for recording and replaying interactions.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecorderError;

/// Header names to values, ordered for stable output.
pub type Headers = BTreeMap<String, String>;

/// How a stored body string is to be turned back into bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyEncoding {
    /// The string is the body, as UTF-8 text.
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    /// The string is standard base64 of arbitrary bytes.
    #[serde(rename = "base64")]
    Base64,
}

/// A stored body: text or base64, or null when nothing was kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    /// Encoded payload, `None` for a null body.
    pub string: Option<String>,
    /// Encoding of `string`.
    #[serde(default)]
    pub encoding: BodyEncoding,
}

impl Body {
    /// A null body.
    #[must_use]
    pub fn null() -> Self {
        Self::default()
    }

    /// A text body.
    pub fn text(text: impl Into<String>) -> Self {
        Self { string: Some(text.into()), encoding: BodyEncoding::Utf8 }
    }

    /// Stores bytes as text when they are valid UTF-8, base64 otherwise.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::text(text),
            Err(_) => Self { string: Some(STANDARD.encode(bytes)), encoding: BodyEncoding::Base64 },
        }
    }

    /// True for a null body.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.string.is_none()
    }

    /// Decodes the body; a null body decodes to no bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::InvalidBody`] if a base64 body does not decode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecorderError> {
        match (&self.string, self.encoding) {
            (None, _) => Ok(Vec::new()),
            (Some(text), BodyEncoding::Utf8) => Ok(text.clone().into_bytes()),
            (Some(encoded), BodyEncoding::Base64) => {
                STANDARD.decode(encoded).map_err(|e| RecorderError::InvalidBody {
                    encoding: "base64".into(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Request half of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method, upper case.
    pub method: String,
    /// Full request URI.
    pub uri: String,
    /// Request headers.
    #[serde(default)]
    pub headers: Headers,
    /// Request body, if any was sent.
    #[serde(default)]
    pub body: Option<Body>,
}

/// Status line of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Numeric status code.
    pub code: u16,
    /// Reason phrase.
    pub message: String,
}

/// Response half of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Status line.
    pub status: Status,
    /// Response headers.
    #[serde(default)]
    pub headers: Headers,
    /// Response body.
    #[serde(default)]
    pub body: Body,
}

/// Which transport produced an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// An [`HttpTransport`](crate::ports::HttpTransport) under an HTTP session.
    Http,
    /// A blocking cURL-style session.
    CurlSession,
    /// An awaitable cURL-style session.
    CurlAsync,
    /// A low-level cURL easy handle.
    CurlEasy,
}

/// One captured HTTP or cURL exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// What was sent.
    pub request: Request,
    /// What came back.
    pub response: Response,
    /// Transport that produced it.
    pub source_type: SourceType,
}

/// One captured FTP command, transfer, or `ftp://` download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtpInteraction {
    /// Command name (`login`, `retrbinary`, ..., or `urlopen` for downloads).
    pub command: String,
    /// Arguments as stored; login credentials are always redacted.
    #[serde(default)]
    pub args: Vec<String>,
    /// Server host the command went to.
    #[serde(default)]
    pub host: String,
    /// URL of an `ftp://` download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Final server reply line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Permanent error text, when the command failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Transferred payload, for transfers and downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl FtpInteraction {
    /// A command entry with no reply yet.
    pub fn command(command: impl Into<String>, args: Vec<String>, host: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args,
            host: host.into(),
            url: None,
            response: None,
            error: None,
            body: None,
        }
    }
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cassette<I = Interaction> {
    /// When this cassette was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
    /// Ordered list of interactions.
    #[serde(default = "Vec::new")]
    pub interactions: Vec<I>,
}

impl<I> Cassette<I> {
    /// A cassette stamped with the current time.
    #[must_use]
    pub fn new(interactions: Vec<I>) -> Self {
        Self { recorded_at: Some(Utc::now()), interactions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_interaction() -> Interaction {
        let mut headers = Headers::new();
        headers.insert("Content-Type".into(), "text/plain".into());
        Interaction {
            request: Request {
                method: "GET".into(),
                uri: "https://example.test/a?apikey=123".into(),
                headers: Headers::new(),
                body: None,
            },
            response: Response {
                status: Status { code: 200, message: "OK".into() },
                headers,
                body: Body::text("hello"),
            },
            source_type: SourceType::CurlSession,
        }
    }

    #[test]
    fn yaml_round_trip() {
        let cassette = Cassette::new(vec![sample_interaction()]);
        let yaml = serde_yaml::to_string(&cassette).expect("serialize");
        let deserialized: Cassette = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(cassette, deserialized);
    }

    #[test]
    fn binary_bodies_are_base64() {
        let body = Body::from_bytes(&[0xff, 0x00, 0x10]);
        assert_eq!(body.encoding, BodyEncoding::Base64);
        assert_eq!(body.to_bytes().unwrap(), vec![0xff, 0x00, 0x10]);

        let text = Body::from_bytes(b"plain");
        assert_eq!(text.encoding, BodyEncoding::Utf8);
        assert_eq!(text.string.as_deref(), Some("plain"));
    }

    #[test]
    fn null_body_decodes_to_nothing() {
        assert!(Body::null().is_null());
        assert!(Body::null().to_bytes().unwrap().is_empty());
    }

    #[test]
    fn corrupt_base64_is_reported() {
        let body = Body { string: Some("@@@".into()), encoding: BodyEncoding::Base64 };
        assert!(matches!(body.to_bytes(), Err(RecorderError::InvalidBody { .. })));
    }

    #[test]
    fn encodings_use_wire_names() {
        let yaml = serde_yaml::to_string(&Body::from_bytes(&[0xfe])).unwrap();
        assert!(yaml.contains("encoding: base64"));
        let yaml = serde_yaml::to_string(&Body::text("x")).unwrap();
        assert!(yaml.contains("encoding: utf-8"));
    }

    #[test]
    fn ftp_entries_omit_absent_fields() {
        let mut entry = FtpInteraction::command("cwd", vec!["/pub".into()], "ftp.example.test");
        entry.response = Some("250 OK".into());
        let yaml = serde_yaml::to_string(&entry).unwrap();
        assert!(!yaml.contains("error"));
        assert!(!yaml.contains("body"));
        let back: FtpInteraction = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn missing_interactions_key_reads_as_empty() {
        let cassette: Cassette = serde_yaml::from_str("recorded_at: null\n").unwrap();
        assert!(cassette.interactions.is_empty());
    }
}
