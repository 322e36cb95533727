//! Per-test sessions that wire a transport to its cassette.
//!
//! A session is opened once per (test, kind). Opening decides the mode,
//! clears a stale cassette before capture, or loads the stored one for replay.
//! The session then hands out decorated transports. Teardown runs exactly once,
//! either through `finish()` or on drop.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use super::config::FilterSpec;
use super::format::{FtpInteraction, Interaction, SourceType};
use super::mode::{decide, prepare_capture, RecordMode};
use super::path::TestId;
use super::recorder::{CassetteRecorder, Recordable, SavePolicy};
use super::replayer::{CassetteReplayer, FtpReplayer};
use crate::adapters::lock;
use crate::adapters::recording::{
    RecordingAsyncHttpTransport, RecordingEasyTransfer, RecordingFtpClient, RecordingHttpTransport,
    RecordingUrlOpener,
};
use crate::adapters::replaying::{
    ReplayingAsyncHttpTransport, ReplayingEasyTransfer, ReplayingFtpClient, ReplayingHttpTransport,
    ReplayingUrlOpener,
};
use crate::error::RecorderError;
use crate::kind::RecordKind;
use crate::options::RecordOptions;
use crate::ports::easy::EasyTransfer;
use crate::ports::ftp::{FtpClient, UrlOpener};
use crate::ports::http::{AsyncHttpTransport, HttpTransport};

/// What an opened session does with the transports it wraps.
pub enum Activation<R, P> {
    /// The test carries no marker for this kind; transports pass through.
    Inert,
    /// Live calls are recorded.
    Capture(Arc<Mutex<R>>),
    /// Calls are answered from the stored cassette.
    Replay(Arc<Mutex<P>>),
}

/// Resolves the record path of `kind` and decides its mode.
///
/// Returns `None` as the mode when the test is not marked for `kind`. A
/// capture removes the stale file first.
///
/// # Errors
///
/// Returns [`RecorderError::Unavailable`] when a marked kind has nothing to
/// replay and was not requested, or an I/O error if the stale file cannot be
/// removed.
pub(crate) fn activate(
    test: &TestId,
    options: &RecordOptions,
    kind: RecordKind,
) -> Result<(PathBuf, Option<RecordMode>), RecorderError> {
    let path = test.cassette_path(kind, options.hash_only());
    if !test.is_marked(kind) {
        debug!(%kind, test = test.test_name(), "No marker, session is inert");
        return Ok((path, None));
    }

    let mode = decide(&options.requested(), kind, path.exists(), options.no_overwrite);
    info!(%kind, ?mode, path = %path.display(), "Record mode decided");
    match mode {
        RecordMode::Capture => prepare_capture(&path)?,
        RecordMode::Replay => {}
        RecordMode::Unavailable => return Err(RecorderError::Unavailable { kind, path }),
    }
    Ok((path, Some(mode)))
}

/// Reports a teardown failure from a destructor.
///
/// Panics with the error so a failed save or verification fails the test,
/// unless the thread is already unwinding, in which case it only logs.
pub(crate) fn fail_on_drop(kind: RecordKind, path: &Path, result: Result<(), RecorderError>) {
    if let Err(err) = result {
        if std::thread::panicking() {
            error!(%kind, path = %path.display(), %err, "Teardown failed while unwinding");
        } else {
            panic!("{err}");
        }
    }
}

struct SessionCore<I: Recordable, P> {
    kind: RecordKind,
    path: PathBuf,
    mode: Option<RecordMode>,
    activation: Activation<CassetteRecorder<I>, P>,
}

impl<I: Recordable, P> SessionCore<I, P> {
    fn open<F>(
        test: &TestId,
        options: &RecordOptions,
        kind: RecordKind,
        filters: FilterSpec,
        policy: SavePolicy,
        load: F,
    ) -> Result<Self, RecorderError>
    where
        F: FnOnce(&Path, &FilterSpec) -> Result<P, RecorderError>,
    {
        let (path, mode) = activate(test, options, kind)?;
        let activation = match mode {
            None => Activation::Inert,
            Some(RecordMode::Capture) => Activation::Capture(Arc::new(Mutex::new(
                CassetteRecorder::new(path.clone(), Arc::new(filters), policy),
            ))),
            Some(_) => Activation::Replay(Arc::new(Mutex::new(load(&path, &filters)?))),
        };
        Ok(Self { kind, path, mode, activation })
    }

    fn finish(&mut self) -> Result<Option<PathBuf>, RecorderError> {
        match &self.activation {
            Activation::Capture(recorder) => lock(recorder).finish(),
            Activation::Inert | Activation::Replay(_) => Ok(None),
        }
    }
}

impl<I: Recordable, P> Drop for SessionCore<I, P> {
    fn drop(&mut self) {
        let result = self.finish().map(|_| ());
        fail_on_drop(self.kind, &self.path, result);
    }
}

/// Session for the HTTP and cURL kinds.
///
/// HTTP cassettes are written even when nothing was recorded; cURL cassettes
/// are skipped when empty.
pub struct HttpSession {
    core: SessionCore<Interaction, CassetteReplayer>,
}

impl HttpSession {
    /// Opens a session of `kind`, which is [`RecordKind::Http`] or
    /// [`RecordKind::Curl`].
    ///
    /// # Errors
    ///
    /// Returns an error if the marked kind has no cassette and was not
    /// requested, or if the stored cassette cannot be loaded.
    pub fn open(
        test: &TestId,
        options: &RecordOptions,
        kind: RecordKind,
        filters: FilterSpec,
    ) -> Result<Self, RecorderError> {
        let policy = if kind == RecordKind::Http { SavePolicy::Always } else { SavePolicy::SkipEmpty };
        let core = SessionCore::open(test, options, kind, filters, policy, CassetteReplayer::load)?;
        Ok(Self { core })
    }

    /// Decided mode, or `None` when the session is inert.
    #[must_use]
    pub fn mode(&self) -> Option<RecordMode> {
        self.core.mode
    }

    /// Cassette path of the session.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.core.path
    }

    fn source_type(&self, curl: SourceType) -> SourceType {
        if self.core.kind == RecordKind::Curl {
            curl
        } else {
            SourceType::Http
        }
    }

    /// Routes a blocking transport through the session.
    #[must_use]
    pub fn wrap(&self, live: Box<dyn HttpTransport>) -> Box<dyn HttpTransport> {
        match &self.core.activation {
            Activation::Inert => live,
            Activation::Capture(recorder) => Box::new(RecordingHttpTransport::new(
                live,
                Arc::clone(recorder),
                self.source_type(SourceType::CurlSession),
            )),
            Activation::Replay(replayer) => {
                Box::new(ReplayingHttpTransport::new(Arc::clone(replayer)))
            }
        }
    }

    /// Routes an awaitable transport through the session.
    #[must_use]
    pub fn wrap_async(&self, live: Box<dyn AsyncHttpTransport>) -> Box<dyn AsyncHttpTransport> {
        match &self.core.activation {
            Activation::Inert => live,
            Activation::Capture(recorder) => Box::new(RecordingAsyncHttpTransport::new(
                live,
                Arc::clone(recorder),
                self.source_type(SourceType::CurlAsync),
            )),
            Activation::Replay(replayer) => {
                Box::new(ReplayingAsyncHttpTransport::new(Arc::clone(replayer)))
            }
        }
    }

    /// Routes a low-level easy handle through the session.
    #[must_use]
    pub fn wrap_easy(&self, live: Box<dyn EasyTransfer>) -> Box<dyn EasyTransfer> {
        match &self.core.activation {
            Activation::Inert => live,
            Activation::Capture(recorder) => {
                Box::new(RecordingEasyTransfer::new(live, Arc::clone(recorder)))
            }
            Activation::Replay(replayer) => {
                Box::new(ReplayingEasyTransfer::new(Arc::clone(replayer)))
            }
        }
    }

    /// Ends the session, writing the cassette when capturing.
    ///
    /// Returns the written path, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be written.
    pub fn finish(mut self) -> Result<Option<PathBuf>, RecorderError> {
        self.core.finish()
    }
}

/// Session for the FTP kind: FTP clients and `ftp://` downloads.
pub struct FtpSession {
    core: SessionCore<FtpInteraction, FtpReplayer>,
}

impl FtpSession {
    /// Opens the FTP session of `test`.
    ///
    /// # Errors
    ///
    /// Returns an error if the marked kind has no cassette and was not
    /// requested, or if the stored cassette cannot be loaded.
    pub fn open(
        test: &TestId,
        options: &RecordOptions,
        filters: FilterSpec,
    ) -> Result<Self, RecorderError> {
        let core = SessionCore::open(
            test,
            options,
            RecordKind::Ftp,
            filters,
            SavePolicy::SkipEmpty,
            FtpReplayer::load,
        )?;
        Ok(Self { core })
    }

    /// Decided mode, or `None` when the session is inert.
    #[must_use]
    pub fn mode(&self) -> Option<RecordMode> {
        self.core.mode
    }

    /// Cassette path of the session.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.core.path
    }

    /// Routes an FTP client through the session.
    #[must_use]
    pub fn wrap(&self, live: Box<dyn FtpClient>) -> Box<dyn FtpClient> {
        match &self.core.activation {
            Activation::Inert => live,
            Activation::Capture(recorder) => {
                Box::new(RecordingFtpClient::new(live, Arc::clone(recorder)))
            }
            Activation::Replay(replayer) => {
                Box::new(ReplayingFtpClient::new(Arc::clone(replayer), live.host()))
            }
        }
    }

    /// Routes an `ftp://` URL opener through the session.
    #[must_use]
    pub fn wrap_url(&self, live: Box<dyn UrlOpener>) -> Box<dyn UrlOpener> {
        match &self.core.activation {
            Activation::Inert => live,
            Activation::Capture(recorder) => {
                Box::new(RecordingUrlOpener::new(live, Arc::clone(recorder)))
            }
            Activation::Replay(replayer) => {
                Box::new(ReplayingUrlOpener::new(Arc::clone(replayer)))
            }
        }
    }

    /// Ends the session, writing the cassette when capturing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be written.
    pub fn finish(mut self) -> Result<Option<PathBuf>, RecorderError> {
        self.core.finish()
    }
}
