//! Registry of recordable categories.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RecorderError;

/// A category of external interaction that can be recorded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Record nothing.
    None,
    /// Record every kind.
    All,
    /// cURL-family calls (sessions, async sessions, easy handles).
    Curl,
    /// FTP commands and `ftp://` downloads.
    Ftp,
    /// Plain HTTP transport calls.
    Http,
    /// Values collected with an object record.
    Object,
    /// Text written to the screen sink.
    Screen,
    /// The wall-clock instant a test travels to.
    Time,
}

impl RecordKind {
    /// Every registered kind, in declaration order.
    pub const ALL: [RecordKind; 8] = [
        RecordKind::None,
        RecordKind::All,
        RecordKind::Curl,
        RecordKind::Ftp,
        RecordKind::Http,
        RecordKind::Object,
        RecordKind::Screen,
        RecordKind::Time,
    ];

    /// Lowercase name used on the command line and in cassette folders.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::None => "none",
            RecordKind::All => "all",
            RecordKind::Curl => "curl",
            RecordKind::Ftp => "ftp",
            RecordKind::Http => "http",
            RecordKind::Object => "object",
            RecordKind::Screen => "screen",
            RecordKind::Time => "time",
        }
    }

    /// Whether a test must opt in with a marker before this kind's session
    /// does anything. Object records are always active.
    #[must_use]
    pub fn requires_marker(self) -> bool {
        !matches!(self, RecordKind::Object)
    }

    /// Name of the marker that activates this kind.
    #[must_use]
    pub fn marker_name(self) -> &'static str {
        match self {
            RecordKind::Curl => "record_curl",
            RecordKind::Ftp => "record_ftp",
            RecordKind::Http => "record_http",
            RecordKind::Screen => "record_screen",
            RecordKind::Time => "record_time",
            RecordKind::None | RecordKind::All | RecordKind::Object => "record",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| RecorderError::UnknownKind(s.to_string()))
    }
}

/// The set of kinds a run asked to record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedKinds(BTreeSet<RecordKind>);

impl RequestedKinds {
    /// Nothing requested: every marked session replays.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses a comma separated list such as `"http,time"`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::UnknownKind`] for a name outside the registry.
    pub fn parse(list: &str) -> Result<Self, RecorderError> {
        list.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<RecordKind>)
            .collect()
    }

    /// True when `kind` should be captured, either directly or through `all`.
    #[must_use]
    pub fn includes(&self, kind: RecordKind) -> bool {
        self.0.contains(&RecordKind::All) || self.0.contains(&kind)
    }

    /// The requested kinds in registry order.
    #[must_use]
    pub fn kinds(&self) -> Vec<RecordKind> {
        self.0.iter().copied().collect()
    }

    /// True when nothing but `none` (or nothing at all) was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|kind| *kind == RecordKind::None)
    }
}

impl FromIterator<RecordKind> for RequestedKinds {
    fn from_iter<T: IntoIterator<Item = RecordKind>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RequestedKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self
            .0
            .iter()
            .filter(|kind| **kind != RecordKind::None)
            .map(|kind| kind.as_str())
            .collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_registered_name() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
        }
        assert_eq!(" HTTP ".parse::<RecordKind>().unwrap(), RecordKind::Http);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "tape".parse::<RecordKind>().unwrap_err();
        assert!(err.to_string().contains("Unknown record kind `tape`"));
    }

    #[test]
    fn all_includes_every_kind() {
        let requested = RequestedKinds::parse("all").unwrap();
        assert!(requested.includes(RecordKind::Http));
        assert!(requested.includes(RecordKind::Ftp));
        assert!(requested.includes(RecordKind::Object));
    }

    #[test]
    fn list_includes_only_named_kinds() {
        let requested = RequestedKinds::parse("http, time").unwrap();
        assert!(requested.includes(RecordKind::Http));
        assert!(requested.includes(RecordKind::Time));
        assert!(!requested.includes(RecordKind::Curl));
        assert_eq!(requested.to_string(), "http,time");
    }

    #[test]
    fn none_requests_nothing() {
        let requested = RequestedKinds::parse("none").unwrap();
        assert!(requested.is_empty());
        assert!(!requested.includes(RecordKind::Http));
        assert_eq!(requested.to_string(), "none");
    }

    #[test]
    fn object_needs_no_marker() {
        assert!(!RecordKind::Object.requires_marker());
        assert!(RecordKind::Curl.requires_marker());
        assert_eq!(RecordKind::Time.marker_name(), "record_time");
    }
}
