//! Recording adapters for the FTP ports.

use std::io::{BufRead, Cursor, Read};
use std::sync::{Arc, Mutex};

use crate::adapters::lock;
use crate::cassette::format::{Body, FtpInteraction};
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::URLOPEN;
use crate::ports::ftp::{FtpClient, FtpError, UrlOpener};

/// Stored in place of every login argument.
pub const REDACTED: &str = "[REDACTED]";

type FtpRecorder = Arc<Mutex<CassetteRecorder<FtpInteraction>>>;

/// Records FTP commands and transfers while delegating to an inner client.
///
/// Permanent errors are recorded and returned unchanged; any other error is
/// returned without a trace in the cassette.
pub struct RecordingFtpClient {
    inner: Box<dyn FtpClient>,
    recorder: FtpRecorder,
}

impl RecordingFtpClient {
    /// Creates a recording client over `inner`.
    pub fn new(inner: Box<dyn FtpClient>, recorder: FtpRecorder) -> Self {
        Self { inner, recorder }
    }

    fn record(
        &self,
        command: &str,
        args: Vec<String>,
        result: &Result<String, FtpError>,
        body: Option<Vec<u8>>,
    ) {
        let mut entry = FtpInteraction::command(command, args, self.inner.host());
        match result {
            Ok(reply) => {
                entry.response = Some(reply.clone());
                entry.body = body.as_deref().map(Body::from_bytes);
            }
            Err(FtpError::Permanent(text)) => entry.error = Some(text.clone()),
            Err(_) => return,
        }
        lock(&self.recorder).record(entry);
    }

    fn command(
        &mut self,
        command: &str,
        args: Vec<String>,
        call: impl FnOnce(&mut dyn FtpClient) -> Result<String, FtpError>,
    ) -> Result<String, FtpError> {
        let result = call(self.inner.as_mut());
        self.record(command, args, &result, None);
        result
    }
}

impl FtpClient for RecordingFtpClient {
    fn host(&self) -> String {
        self.inner.host()
    }

    fn login(&mut self, user: &str, passwd: &str) -> Result<String, FtpError> {
        let args = vec![REDACTED.to_string(), REDACTED.to_string()];
        self.command("login", args, |ftp| ftp.login(user, passwd))
    }

    fn cwd(&mut self, dirname: &str) -> Result<String, FtpError> {
        self.command("cwd", vec![dirname.to_string()], |ftp| ftp.cwd(dirname))
    }

    fn mkd(&mut self, dirname: &str) -> Result<String, FtpError> {
        self.command("mkd", vec![dirname.to_string()], |ftp| ftp.mkd(dirname))
    }

    fn rmd(&mut self, dirname: &str) -> Result<String, FtpError> {
        self.command("rmd", vec![dirname.to_string()], |ftp| ftp.rmd(dirname))
    }

    fn delete(&mut self, filename: &str) -> Result<String, FtpError> {
        self.command("delete", vec![filename.to_string()], |ftp| ftp.delete(filename))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<String, FtpError> {
        self.command("rename", vec![from.to_string(), to.to_string()], |ftp| ftp.rename(from, to))
    }

    fn pwd(&mut self) -> Result<String, FtpError> {
        self.command("pwd", Vec::new(), |ftp| ftp.pwd())
    }

    fn quit(&mut self) -> Result<String, FtpError> {
        self.command("quit", Vec::new(), |ftp| ftp.quit())
    }

    fn retrbinary(
        &mut self,
        cmd: &str,
        callback: &mut dyn FnMut(&[u8]),
        blocksize: usize,
    ) -> Result<String, FtpError> {
        let mut received = Vec::new();
        let mut capture = |block: &[u8]| {
            received.extend_from_slice(block);
            callback(block);
        };
        let result = self.inner.retrbinary(cmd, &mut capture, blocksize);
        self.record("retrbinary", vec![cmd.to_string()], &result, Some(received));
        result
    }

    fn retrlines(&mut self, cmd: &str, callback: &mut dyn FnMut(&str)) -> Result<String, FtpError> {
        let mut lines: Vec<String> = Vec::new();
        let mut capture = |line: &str| {
            lines.push(line.to_string());
            callback(line);
        };
        let result = self.inner.retrlines(cmd, &mut capture);
        self.record("retrlines", vec![cmd.to_string()], &result, Some(lines.join("\n").into_bytes()));
        result
    }

    fn storbinary(
        &mut self,
        cmd: &str,
        reader: &mut dyn Read,
        blocksize: usize,
    ) -> Result<String, FtpError> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let result = self.inner.storbinary(cmd, &mut Cursor::new(content.as_slice()), blocksize);
        self.record("storbinary", vec![cmd.to_string()], &result, Some(content));
        result
    }

    fn storlines(&mut self, cmd: &str, reader: &mut dyn BufRead) -> Result<String, FtpError> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let result = self.inner.storlines(cmd, &mut Cursor::new(content.as_slice()));
        self.record("storlines", vec![cmd.to_string()], &result, Some(content));
        result
    }
}

/// Records `ftp://` downloads as `urlopen` entries.
pub struct RecordingUrlOpener {
    inner: Box<dyn UrlOpener>,
    recorder: FtpRecorder,
}

impl RecordingUrlOpener {
    /// Creates a recording opener over `inner`.
    pub fn new(inner: Box<dyn UrlOpener>, recorder: FtpRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl UrlOpener for RecordingUrlOpener {
    fn open(&self, url: &str) -> Result<Vec<u8>, FtpError> {
        let result = self.inner.open(url);
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string))
            .unwrap_or_default();
        let mut entry = FtpInteraction::command(URLOPEN, Vec::new(), host);
        entry.url = Some(url.to_string());
        match &result {
            Ok(data) => entry.body = Some(Body::from_bytes(data)),
            Err(FtpError::Permanent(text)) => entry.error = Some(text.clone()),
            Err(_) => return result,
        }
        lock(&self.recorder).record(entry);
        result
    }
}
