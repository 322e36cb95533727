//! Replays recorded interactions from a cassette.
//!
//! HTTP-family calls are matched by URI in tiers, so a call whose query was
//! redacted at capture time still finds its interaction. FTP commands are
//! served from a forward-moving cursor.

use std::path::{Path, PathBuf};

use super::config::FilterSpec;
use super::format::{Cassette, FtpInteraction, Interaction};
use super::store;
use crate::error::RecorderError;
use crate::filter;

/// Serves stored HTTP and cURL interactions by URI.
#[derive(Debug)]
pub struct CassetteReplayer {
    path: PathBuf,
    interactions: Vec<Interaction>,
    used: Vec<bool>,
    query_rules: Vec<(String, String)>,
    allow_repeats: bool,
    loose: bool,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, cassette: Cassette, spec: &FilterSpec) -> Self {
        let used = vec![false; cassette.interactions.len()];
        Self {
            path: path.into(),
            interactions: cassette.interactions,
            used,
            query_rules: spec.filter_query_parameters.clone(),
            allow_repeats: spec.allow_playback_repeats,
            loose: spec.loose_matching,
        }
    }

    /// Loads the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette is missing or malformed.
    pub fn load(path: &Path, spec: &FilterSpec) -> Result<Self, RecorderError> {
        Ok(Self::new(path, store::load(path)?, spec))
    }

    /// Returns the stored interaction answering a call to `uri`.
    ///
    /// Tried in order: the exact (redacted) URI among unused interactions,
    /// the URI without its query among unused interactions, the same two
    /// against used interactions when repeats are allowed, and finally the
    /// first unused interaction when loose matching is on.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::NoMatchingInteraction`] when no tier matches.
    pub fn next_match(&mut self, uri: &str) -> Result<Interaction, RecorderError> {
        let wanted = filter::redact_query(uri, &self.query_rules);
        let wanted_path = without_query(&wanted);

        let exact = |i: &Interaction| i.request.uri == wanted;
        let same_path = |i: &Interaction| without_query(&i.request.uri) == wanted_path;

        let index = self
            .find(false, exact)
            .or_else(|| self.find(false, same_path))
            .or_else(|| if self.allow_repeats { self.find(true, exact) } else { None })
            .or_else(|| if self.allow_repeats { self.find(true, same_path) } else { None })
            .or_else(|| if self.loose { self.find(false, |_| true) } else { None })
            .or_else(|| (self.loose && self.allow_repeats && !self.interactions.is_empty()).then_some(0));

        match index {
            Some(index) => {
                self.used[index] = true;
                Ok(self.interactions[index].clone())
            }
            None => Err(RecorderError::NoMatchingInteraction {
                path: self.path.clone(),
                criteria: format!("URI {uri}"),
                total: self.interactions.len(),
                used: self.used_count(),
            }),
        }
    }

    /// Number of interactions served at least once.
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|used| **used).count()
    }

    /// Number of stored interactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// True when the cassette holds no interactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    fn find(&self, include_used: bool, matches: impl Fn(&Interaction) -> bool) -> Option<usize> {
        self.interactions
            .iter()
            .enumerate()
            .find(|(index, i)| (include_used || !self.used[*index]) && matches(i))
            .map(|(index, _)| index)
    }
}

fn without_query(uri: &str) -> &str {
    uri.split(['?', '#']).next().unwrap_or(uri)
}

/// Serves stored FTP entries in order.
#[derive(Debug)]
pub struct FtpReplayer {
    path: PathBuf,
    entries: Vec<FtpInteraction>,
    cursor: usize,
    argument_rules: Vec<(String, String)>,
    allow_repeats: bool,
    loose: bool,
}

/// Command name under which `ftp://` downloads are stored.
pub const URLOPEN: &str = "urlopen";

impl FtpReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, cassette: Cassette<FtpInteraction>, spec: &FilterSpec) -> Self {
        Self {
            path: path.into(),
            entries: cassette.interactions,
            cursor: 0,
            argument_rules: spec.filter_arguments.clone(),
            allow_repeats: spec.allow_playback_repeats,
            loose: spec.loose_matching,
        }
    }

    /// Loads the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette is missing or malformed.
    pub fn load(path: &Path, spec: &FilterSpec) -> Result<Self, RecorderError> {
        Ok(Self::new(path, store::load(path)?, spec))
    }

    /// Returns the next stored entry for `command` with `args`.
    ///
    /// `login` takes the next login entry without looking at credentials.
    /// Other commands compare the filtered arguments.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::NoMatchingInteraction`] when nothing ahead of
    /// the cursor matches.
    pub fn next_command(&mut self, command: &str, args: &[String]) -> Result<FtpInteraction, RecorderError> {
        if command == "login" {
            return self.advance_to(|entry| entry.command == "login", || "login".to_string());
        }
        let wanted = filter::filter_arguments(args, &self.argument_rules);
        self.advance_to(
            |entry| entry.command == command && entry.args == wanted,
            || format!("{command} {wanted:?}"),
        )
    }

    /// Returns the stored download of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::NoMatchingInteraction`] when no download of
    /// that URL is ahead of the cursor (and loose matching is off).
    pub fn next_download(&mut self, url: &str) -> Result<FtpInteraction, RecorderError> {
        let wanted = filter::filter_text(url, &self.argument_rules);
        let exact = self.advance_to(
            |entry| entry.command == URLOPEN && entry.url.as_deref() == Some(wanted.as_str()),
            || format!("{URLOPEN} {url}"),
        );
        match exact {
            Err(RecorderError::NoMatchingInteraction { .. }) if self.loose => {
                self.advance_to(|entry| entry.command == URLOPEN, || format!("{URLOPEN} {url}"))
            }
            other => other,
        }
    }

    fn advance_to(
        &mut self,
        matches: impl Fn(&FtpInteraction) -> bool,
        criteria: impl FnOnce() -> String,
    ) -> Result<FtpInteraction, RecorderError> {
        let ahead = self.entries.iter().enumerate().skip(self.cursor).find(|(_, e)| matches(e));
        let found = match ahead {
            Some(found) => Some(found),
            None if self.allow_repeats => self.entries.iter().enumerate().find(|(_, e)| matches(e)),
            None => None,
        };

        match found {
            Some((index, entry)) => {
                let entry = entry.clone();
                self.cursor = self.cursor.max(index + 1);
                Ok(entry)
            }
            None => Err(RecorderError::NoMatchingInteraction {
                path: self.path.clone(),
                criteria: criteria(),
                total: self.entries.len(),
                used: self.cursor,
            }),
        }
    }
}
