//! Per-test entry point bundling the run options with the test identity.

use std::path::PathBuf;

use crate::cassette::config::FilterSpec;
use crate::cassette::mode::{decide, RecordMode};
use crate::cassette::path::TestId;
use crate::cassette::session::{FtpSession, HttpSession};
use crate::error::RecorderError;
use crate::kind::RecordKind;
use crate::options::RecordOptions;
use crate::screen::ScreenRecord;
use crate::time::{TimeTravel, TravelSpec};
use crate::verify::ObjectRecord;

/// Hands out the record sessions of one test.
///
/// ```no_run
/// use tapedeck::{FilterSpec, RecordKind, Recorder, TestId};
/// use tapedeck::adapters::live::ReqwestTransport;
///
/// let test = TestId::new(file!(), "fetch_quote").with_marker(RecordKind::Http);
/// let recorder = Recorder::from_env(test)?;
/// let session = recorder.http(FilterSpec::default().filter_query_parameter("apikey", "MOCK"))?;
/// let transport = session.wrap(Box::new(ReqwestTransport::new()));
/// let quote = transport.get("https://quotes.example.com/v1/ABC?apikey=secret")?;
/// # let _ = quote;
/// session.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Recorder {
    options: RecordOptions,
    test: TestId,
}

impl Recorder {
    /// Binds `options` to `test`.
    #[must_use]
    pub fn new(options: RecordOptions, test: TestId) -> Self {
        Self { options, test }
    }

    /// Reads options from the environment and binds them to `test`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record variable names an unknown kind.
    pub fn from_env(test: TestId) -> Result<Self, RecorderError> {
        Ok(Self::new(RecordOptions::from_env()?, test))
    }

    /// The test this recorder belongs to.
    #[must_use]
    pub fn test(&self) -> &TestId {
        &self.test
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &RecordOptions {
        &self.options
    }

    /// Where the record of `kind` lives for this test.
    #[must_use]
    pub fn cassette_path(&self, kind: RecordKind) -> PathBuf {
        self.test.cassette_path(kind, self.options.hash_only())
    }

    /// The mode a session of `kind` would run in, without opening it.
    /// `None` means the test is not marked for `kind`.
    #[must_use]
    pub fn mode(&self, kind: RecordKind) -> Option<RecordMode> {
        if !self.test.is_marked(kind) {
            return None;
        }
        let exists = self.cassette_path(kind).exists();
        Some(decide(&self.options.requested(), kind, exists, self.options.no_overwrite))
    }

    /// Opens the HTTP session.
    ///
    /// # Errors
    ///
    /// See [`HttpSession::open`].
    pub fn http(&self, filters: FilterSpec) -> Result<HttpSession, RecorderError> {
        HttpSession::open(&self.test, &self.options, RecordKind::Http, filters)
    }

    /// Opens the cURL session (sessions, async sessions and easy handles).
    ///
    /// # Errors
    ///
    /// See [`HttpSession::open`].
    pub fn curl(&self, filters: FilterSpec) -> Result<HttpSession, RecorderError> {
        HttpSession::open(&self.test, &self.options, RecordKind::Curl, filters)
    }

    /// Opens the FTP session.
    ///
    /// # Errors
    ///
    /// See [`FtpSession::open`].
    pub fn ftp(&self, filters: FilterSpec) -> Result<FtpSession, RecorderError> {
        FtpSession::open(&self.test, &self.options, filters)
    }

    /// Opens the time session, travelling to `destination` when capturing.
    ///
    /// # Errors
    ///
    /// See [`TimeTravel::open`].
    pub fn time(&self, destination: Option<TravelSpec>) -> Result<TimeTravel, RecorderError> {
        TimeTravel::open(&self.test, &self.options, destination)
    }

    /// Opens the object record.
    ///
    /// # Errors
    ///
    /// See [`ObjectRecord::open`].
    pub fn objects(&self) -> Result<ObjectRecord, RecorderError> {
        ObjectRecord::open(&self.test, &self.options)
    }

    /// Opens the screen record.
    ///
    /// # Errors
    ///
    /// See [`ScreenRecord::open`].
    pub fn screen(&self) -> Result<ScreenRecord, RecorderError> {
        ScreenRecord::open(&self.test, &self.options)
    }
}
