//! Screen records: text a test prints, verified line by line.

use std::io::{self, Write};
use std::path::Path;

use crate::cassette::mode::RecordMode;
use crate::cassette::path::TestId;
use crate::error::RecorderError;
use crate::kind::RecordKind;
use crate::options::RecordOptions;
use crate::verify::Verifier;

/// A screen sink for one test.
///
/// Code under test writes to it instead of stdout. Each completed line is
/// collected and, like object records, stored on capture and compared on
/// replay. An optional inner writer still receives every byte. Unmarked
/// tests only forward to the inner writer.
pub struct ScreenRecord {
    verifier: Verifier,
    pending: Vec<u8>,
    tee: Option<Box<dyn Write + Send>>,
}

impl ScreenRecord {
    /// Opens the screen record of `test`.
    ///
    /// # Errors
    ///
    /// Returns an error if the test is marked, nothing is stored, and screen
    /// recording was not requested.
    pub fn open(test: &TestId, options: &RecordOptions) -> Result<Self, RecorderError> {
        Ok(Self {
            verifier: Verifier::open(test, options, RecordKind::Screen)?,
            pending: Vec::new(),
            tee: None,
        })
    }

    /// Also forwards everything written to `inner`, e.g. `io::stdout()`.
    #[must_use]
    pub fn tee(mut self, inner: Box<dyn Write + Send>) -> Self {
        self.tee = Some(inner);
        self
    }

    /// Decided mode, or `None` when the session is inert.
    #[must_use]
    pub fn mode(&self) -> Option<RecordMode> {
        self.verifier.mode()
    }

    /// Record path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.verifier.path()
    }

    fn take_lines(&mut self) {
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let text = String::from_utf8_lossy(&line[..end]);
            self.verifier.push(text.trim_end_matches('\r'));
        }
    }

    fn take_rest(&mut self) {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.verifier.push(&String::from_utf8_lossy(&rest));
        }
    }

    /// Saves or verifies the collected lines. A trailing partial line counts
    /// as a line.
    ///
    /// # Errors
    ///
    /// Returns a mismatch error when verification fails, or an I/O or parse
    /// error for the record file.
    pub fn finish(mut self) -> Result<(), RecorderError> {
        self.take_rest();
        self.verifier.finish()
    }
}

impl Write for ScreenRecord {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(inner) = self.tee.as_mut() {
            inner.write_all(buf)?;
        }
        if self.verifier.is_active() {
            self.pending.extend_from_slice(buf);
            self.take_lines();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.tee.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for ScreenRecord {
    fn drop(&mut self) {
        // The verifier's own drop runs next and performs the check.
        self.take_rest();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::easy::SharedBuffer;

    fn marked(dir: &Path) -> TestId {
        TestId::new(dir.join("report.rs"), "summary").with_marker(RecordKind::Screen)
    }

    #[test]
    fn lines_are_captured_and_verified() {
        let dir = tempfile::tempdir().unwrap();
        let options =
            RecordOptions { no_hash: true, ..RecordOptions::recording(&[RecordKind::Screen]) };
        let mut screen = ScreenRecord::open(&marked(dir.path()), &options).unwrap();
        write!(screen, "total: ").unwrap();
        writeln!(screen, "42").unwrap();
        write!(screen, "done").unwrap();
        let path = screen.path().to_path_buf();
        screen.finish().unwrap();

        assert!(path.ends_with("record/screen/report/summary.json"));
        let stored: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored, vec!["total: 42", "done"]);

        let replay = RecordOptions { no_hash: true, ..RecordOptions::default() };
        let mut screen = ScreenRecord::open(&marked(dir.path()), &replay).unwrap();
        writeln!(screen, "total: 42").unwrap();
        writeln!(screen, "done").unwrap();
        screen.finish().unwrap();
    }

    #[test]
    fn changed_output_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let mut screen =
            ScreenRecord::open(&marked(dir.path()), &RecordOptions::recording(&[RecordKind::Screen]))
                .unwrap();
        writeln!(screen, "price 10").unwrap();
        let path = screen.path().to_path_buf();
        screen.finish().unwrap();
        assert!(path.ends_with("record/screen_hash/report/summary.json"));

        let mut screen = ScreenRecord::open(&marked(dir.path()), &RecordOptions::default()).unwrap();
        writeln!(screen, "price 11").unwrap();
        let err = screen.finish().unwrap_err();
        assert!(matches!(err, RecorderError::ValueMismatch { index: 0, .. }));
    }

    #[test]
    fn unmarked_screen_only_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let test = TestId::new(dir.path().join("report.rs"), "summary");
        let out = SharedBuffer::new();
        let mut screen = ScreenRecord::open(&test, &RecordOptions::default())
            .unwrap()
            .tee(Box::new(out.clone()));
        writeln!(screen, "hello").unwrap();
        assert_eq!(screen.mode(), None);
        screen.finish().unwrap();

        assert_eq!(out.text(), "hello\n");
        assert!(!dir.path().join("record").exists());
    }
}
