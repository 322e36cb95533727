//! Redaction and rewrite pipeline applied to captured interactions.
//!
//! Runs only at capture time, so secrets never reach a cassette. Replay
//! matching works on the redacted form.

use std::sync::Arc;

use reqwest::Url;
use tracing::warn;

use crate::cassette::config::FilterSpec;
use crate::cassette::format::{Body, FtpInteraction, Headers, Interaction, Response, Status};

/// Error type returned by a response hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// A user rewrite applied to each captured response.
pub type ResponseHook = Arc<dyn Fn(&Response) -> Result<HookOutcome, HookError> + Send + Sync>;

/// What a response hook wants done with the response it saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Use this response instead.
    Replace(Response),
    /// Overwrite only the given parts.
    Patch(ResponsePatch),
    /// Replace the body with this text.
    Body(String),
    /// Do not record the interaction at all.
    Drop,
}

/// Partial response update for [`HookOutcome::Patch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponsePatch {
    /// New status line.
    pub status: Option<Status>,
    /// New header map.
    pub headers: Option<Headers>,
    /// New body.
    pub body: Option<Body>,
}

/// Runs the full pipeline on one interaction. `None` means a hook vetoed it.
#[must_use]
pub fn apply(mut interaction: Interaction, spec: &FilterSpec) -> Option<Interaction> {
    redact_headers(&mut interaction.request.headers, &spec.filter_headers);
    redact_headers(&mut interaction.response.headers, &spec.filter_headers);
    interaction.request.uri = redact_query(&interaction.request.uri, &spec.filter_query_parameters);

    interaction.response = run_response_hooks(interaction.response, spec)?;
    Some(interaction)
}

/// Overwrites or deletes every header whose name matches a rule, ignoring case.
pub fn redact_headers(headers: &mut Headers, rules: &[(String, Option<String>)]) {
    for (name, replacement) in rules {
        let matching: Vec<String> =
            headers.keys().filter(|key| key.eq_ignore_ascii_case(name)).cloned().collect();
        for key in matching {
            match replacement {
                Some(value) => {
                    headers.insert(key, value.clone());
                }
                None => {
                    headers.remove(&key);
                }
            }
        }
    }
}

/// Replaces named query parameter values and reserializes the URI.
///
/// Parameters keep the order of their first occurrence; repeats of a redacted
/// parameter collapse into one. URIs that do not parse, or carry none of the
/// named parameters, come back unchanged.
#[must_use]
pub fn redact_query(uri: &str, rules: &[(String, String)]) -> String {
    if rules.is_empty() {
        return uri.to_string();
    }
    let Ok(mut url) = Url::parse(uri) else {
        return uri.to_string();
    };
    let replacement_for =
        |key: &str| rules.iter().find(|(name, _)| name == key).map(|(_, value)| value);

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if !pairs.iter().any(|(key, _)| replacement_for(key).is_some()) {
        return uri.to_string();
    }

    let mut rewritten: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match replacement_for(&key) {
            Some(replacement) => {
                if !rewritten.iter().any(|(seen, _)| *seen == key) {
                    rewritten.push((key, replacement.clone()));
                }
            }
            None => rewritten.push((key, value)),
        }
    }

    url.query_pairs_mut().clear().extend_pairs(&rewritten);
    url.to_string()
}

/// Runs the hooks in order, returning `None` if one of them drops the response.
///
/// A failing hook is logged and skipped; the response it was given is kept.
#[must_use]
pub fn run_response_hooks(mut response: Response, spec: &FilterSpec) -> Option<Response> {
    for (position, hook) in spec.before_record_response.iter().enumerate() {
        match hook(&response) {
            Ok(HookOutcome::Replace(replacement)) => response = replacement,
            Ok(HookOutcome::Patch(patch)) => {
                if let Some(status) = patch.status {
                    response.status = status;
                }
                if let Some(headers) = patch.headers {
                    response.headers = headers;
                }
                if let Some(body) = patch.body {
                    response.body = body;
                }
            }
            Ok(HookOutcome::Body(text)) => response.body = Body::text(text),
            Ok(HookOutcome::Drop) => return None,
            Err(e) => warn!(hook = position, error = %e, "Response hook failed, skipping it"),
        }
    }
    Some(response)
}

/// Replaces every configured literal inside each argument.
#[must_use]
pub fn filter_arguments(args: &[String], rules: &[(String, String)]) -> Vec<String> {
    args.iter().map(|arg| filter_text(arg, rules)).collect()
}

/// Replaces every configured literal inside `text`.
#[must_use]
pub fn filter_text(text: &str, rules: &[(String, String)]) -> String {
    rules
        .iter()
        .filter(|(literal, _)| !literal.is_empty())
        .fold(text.to_string(), |acc, (literal, replacement)| acc.replace(literal, replacement))
}

/// Filters an FTP entry: argument and host literals, then the response hooks
/// over a response built from the reply line and body. Error entries only get
/// the literal replacement.
#[must_use]
pub fn apply_ftp(mut entry: FtpInteraction, spec: &FilterSpec) -> Option<FtpInteraction> {
    entry.args = filter_arguments(&entry.args, &spec.filter_arguments);
    entry.host = filter_text(&entry.host, &spec.filter_arguments);
    if let Some(url) = entry.url.take() {
        entry.url = Some(filter_text(&url, &spec.filter_arguments));
    }

    if spec.before_record_response.is_empty() || entry.error.is_some() {
        return Some(entry);
    }

    let reply = entry.response.clone().unwrap_or_default();
    let response = Response {
        status: Status { code: reply_code(&reply), message: reply.clone() },
        headers: Headers::new(),
        body: entry.body.clone().unwrap_or_default(),
    };
    let filtered = run_response_hooks(response, spec)?;

    if entry.response.is_some() || filtered.status.message != reply {
        entry.response = Some(filtered.status.message);
    }
    if entry.body.is_some() || !filtered.body.is_null() {
        entry.body = Some(filtered.body);
    }
    Some(entry)
}

/// Numeric code at the start of an FTP reply line, 0 if there is none.
fn reply_code(reply: &str) -> u16 {
    let digits: String = reply.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
