//! Replaying adapters for the FTP ports.

use std::io::{BufRead, Read};
use std::sync::{Arc, Mutex};

use crate::adapters::lock;
use crate::cassette::format::FtpInteraction;
use crate::cassette::replayer::FtpReplayer;
use crate::ports::ftp::{FtpClient, FtpError, UrlOpener};

const TRANSFER_COMPLETE: &str = "226 Transfer complete.";
const COMMAND_SUCCESSFUL: &str = "250 Command successful.";

/// Answers FTP commands from a cassette without touching the network.
pub struct ReplayingFtpClient {
    replayer: Arc<Mutex<FtpReplayer>>,
    host: String,
}

impl ReplayingFtpClient {
    /// Creates a replaying client that reports `host`.
    pub fn new(replayer: Arc<Mutex<FtpReplayer>>, host: impl Into<String>) -> Self {
        Self { replayer, host: host.into() }
    }

    fn next(&self, command: &str, args: &[String]) -> Result<FtpInteraction, FtpError> {
        let entry = lock(&self.replayer).next_command(command, args)?;
        match entry.error {
            Some(text) => Err(FtpError::Permanent(text)),
            None => Ok(entry),
        }
    }

    fn command(&self, command: &str, args: &[String]) -> Result<String, FtpError> {
        let entry = self.next(command, args)?;
        Ok(entry.response.unwrap_or_else(|| COMMAND_SUCCESSFUL.to_string()))
    }

    fn transfer(&self, command: &str, cmd: &str) -> Result<(String, Vec<u8>), FtpError> {
        let entry = self.next(command, &[cmd.to_string()])?;
        let body = match &entry.body {
            Some(body) => body.to_bytes()?,
            None => Vec::new(),
        };
        Ok((entry.response.unwrap_or_else(|| TRANSFER_COMPLETE.to_string()), body))
    }
}

impl FtpClient for ReplayingFtpClient {
    fn host(&self) -> String {
        self.host.clone()
    }

    fn login(&mut self, _user: &str, _passwd: &str) -> Result<String, FtpError> {
        self.command("login", &[])
    }

    fn cwd(&mut self, dirname: &str) -> Result<String, FtpError> {
        self.command("cwd", &[dirname.to_string()])
    }

    fn mkd(&mut self, dirname: &str) -> Result<String, FtpError> {
        self.command("mkd", &[dirname.to_string()])
    }

    fn rmd(&mut self, dirname: &str) -> Result<String, FtpError> {
        self.command("rmd", &[dirname.to_string()])
    }

    fn delete(&mut self, filename: &str) -> Result<String, FtpError> {
        self.command("delete", &[filename.to_string()])
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<String, FtpError> {
        self.command("rename", &[from.to_string(), to.to_string()])
    }

    fn pwd(&mut self) -> Result<String, FtpError> {
        self.command("pwd", &[])
    }

    fn quit(&mut self) -> Result<String, FtpError> {
        self.command("quit", &[])
    }

    fn retrbinary(
        &mut self,
        cmd: &str,
        callback: &mut dyn FnMut(&[u8]),
        blocksize: usize,
    ) -> Result<String, FtpError> {
        let (reply, body) = self.transfer("retrbinary", cmd)?;
        for block in body.chunks(blocksize.max(1)) {
            callback(block);
        }
        Ok(reply)
    }

    fn retrlines(&mut self, cmd: &str, callback: &mut dyn FnMut(&str)) -> Result<String, FtpError> {
        let (reply, body) = self.transfer("retrlines", cmd)?;
        let text = String::from_utf8_lossy(&body);
        for line in text.lines() {
            callback(line);
        }
        Ok(reply)
    }

    fn storbinary(
        &mut self,
        cmd: &str,
        _reader: &mut dyn Read,
        _blocksize: usize,
    ) -> Result<String, FtpError> {
        Ok(self.transfer("storbinary", cmd)?.0)
    }

    fn storlines(&mut self, cmd: &str, _reader: &mut dyn BufRead) -> Result<String, FtpError> {
        Ok(self.transfer("storlines", cmd)?.0)
    }
}

/// Answers `ftp://` downloads from a cassette.
pub struct ReplayingUrlOpener {
    replayer: Arc<Mutex<FtpReplayer>>,
}

impl ReplayingUrlOpener {
    /// Creates a replaying opener.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<FtpReplayer>>) -> Self {
        Self { replayer }
    }
}

impl UrlOpener for ReplayingUrlOpener {
    fn open(&self, url: &str) -> Result<Vec<u8>, FtpError> {
        let entry = lock(&self.replayer).next_download(url)?;
        if let Some(text) = entry.error {
            return Err(FtpError::Permanent(text));
        }
        match entry.body {
            Some(body) => Ok(body.to_bytes()?),
            None => Ok(Vec::new()),
        }
    }
}
