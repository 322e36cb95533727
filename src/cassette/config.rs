//! Per-session filter and matching configuration.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::format::Response;
use crate::error::RecorderError;
use crate::filter::{HookError, HookOutcome, ResponseHook};

/// Inclusive range of status codes whose exchanges are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusRange {
    /// Lowest recorded status.
    pub min: u16,
    /// Highest recorded status.
    pub max: u16,
}

impl StatusRange {
    /// Every status code.
    #[must_use]
    pub fn any() -> Self {
        Self { min: 0, max: u16::MAX }
    }

    /// Whether `code` falls inside the range.
    #[must_use]
    pub fn contains(&self, code: u16) -> bool {
        (self.min..=self.max).contains(&code)
    }
}

impl Default for StatusRange {
    fn default() -> Self {
        Self { min: 200, max: 299 }
    }
}

/// Filters applied before persistence, plus replay matching switches.
///
/// Built in code, or loaded from YAML with the keys `filter_headers`,
/// `filter_query_parameters`, `filter_arguments`, `allow_playback_repeats`,
/// `loose_matching` and `record_status`. Response hooks only exist in code.
/// Unknown keys are rejected.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    /// Header name to replacement; `None` deletes the header.
    #[serde(default)]
    pub filter_headers: Vec<(String, Option<String>)>,
    /// Query parameter name to replacement value.
    #[serde(default)]
    pub filter_query_parameters: Vec<(String, String)>,
    /// Response rewrite hooks, run in registration order.
    #[serde(skip)]
    pub before_record_response: Vec<ResponseHook>,
    /// Allow a stored interaction to answer more than one call.
    #[serde(default)]
    pub allow_playback_repeats: bool,
    /// FTP: literal substrings of arguments and host to replace.
    #[serde(default)]
    pub filter_arguments: Vec<(String, String)>,
    /// Fall back to the next unused interaction when nothing matches the URI.
    #[serde(default)]
    pub loose_matching: bool,
    /// Statuses of HTTP-family exchanges that are persisted.
    #[serde(default)]
    pub record_status: StatusRange,
}

impl FilterSpec {
    /// Loads a filter configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// contains an unknown key.
    pub fn load(path: &Path) -> Result<Self, RecorderError> {
        crate::cassette::store::load(path)
    }

    /// Redacts `name` in request and response headers; `None` deletes it.
    #[must_use]
    pub fn filter_header(mut self, name: &str, replacement: Option<&str>) -> Self {
        self.filter_headers.push((name.to_string(), replacement.map(str::to_string)));
        self
    }

    /// Replaces the value of query parameter `name`.
    #[must_use]
    pub fn filter_query_parameter(mut self, name: &str, replacement: &str) -> Self {
        self.filter_query_parameters.push((name.to_string(), replacement.to_string()));
        self
    }

    /// Replaces `value` wherever it occurs in FTP arguments and host names.
    #[must_use]
    pub fn filter_argument(mut self, value: &str, replacement: &str) -> Self {
        self.filter_arguments.push((value.to_string(), replacement.to_string()));
        self
    }

    /// Appends a response rewrite hook.
    #[must_use]
    pub fn before_record_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Response) -> Result<HookOutcome, HookError> + Send + Sync + 'static,
    {
        self.before_record_response.push(Arc::new(hook));
        self
    }

    /// Sets whether replay may reuse interactions.
    #[must_use]
    pub fn allow_playback_repeats(mut self, allow: bool) -> Self {
        self.allow_playback_repeats = allow;
        self
    }

    /// Sets whether replay falls back to unrelated unused interactions.
    #[must_use]
    pub fn loose_matching(mut self, loose: bool) -> Self {
        self.loose_matching = loose;
        self
    }

    /// Sets the persisted status range.
    #[must_use]
    pub fn record_status(mut self, min: u16, max: u16) -> Self {
        self.record_status = StatusRange { min, max };
        self
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSpec")
            .field("filter_headers", &self.filter_headers)
            .field("filter_query_parameters", &self.filter_query_parameters)
            .field("before_record_response", &self.before_record_response.len())
            .field("allow_playback_repeats", &self.allow_playback_repeats)
            .field("filter_arguments", &self.filter_arguments)
            .field("loose_matching", &self.loose_matching)
            .field("record_status", &self.record_status)
            .finish()
    }
}
