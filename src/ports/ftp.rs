//! FTP client and `ftp://` URL opener ports.

use std::io::{BufRead, Read};

use thiserror::Error;

use crate::error::RecorderError;

/// Errors surfaced by FTP clients.
#[derive(Debug, Error)]
pub enum FtpError {
    /// 5xx reply; the text is the server's reply line.
    #[error("{0}")]
    Permanent(String),
    /// 4xx reply.
    #[error("{0}")]
    Temporary(String),
    /// Unexpected reply or broken exchange.
    #[error("FTP protocol error: {0}")]
    Protocol(String),
    /// Socket or local stream failure.
    #[error("FTP I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Replay could not serve the call.
    #[error(transparent)]
    Replay(#[from] RecorderError),
}

/// An FTP control connection, modelled on the classic client command set.
///
/// Every method returns the server's final reply line, except `pwd` and
/// `mkd` which return the directory name.
pub trait FtpClient: Send {
    /// Server host name.
    fn host(&self) -> String;

    /// `USER`/`PASS` exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the login.
    fn login(&mut self, user: &str, passwd: &str) -> Result<String, FtpError>;

    /// Change directory.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply.
    fn cwd(&mut self, dirname: &str) -> Result<String, FtpError>;

    /// Create a directory.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply.
    fn mkd(&mut self, dirname: &str) -> Result<String, FtpError>;

    /// Remove a directory.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply.
    fn rmd(&mut self, dirname: &str) -> Result<String, FtpError>;

    /// Delete a file.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply.
    fn delete(&mut self, filename: &str) -> Result<String, FtpError>;

    /// Rename a file.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply.
    fn rename(&mut self, from: &str, to: &str) -> Result<String, FtpError>;

    /// Current directory.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply.
    fn pwd(&mut self) -> Result<String, FtpError>;

    /// Close the session politely.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply.
    fn quit(&mut self) -> Result<String, FtpError>;

    /// Binary retrieval; `callback` receives blocks of at most `blocksize` bytes.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply or a transfer failure.
    fn retrbinary(
        &mut self,
        cmd: &str,
        callback: &mut dyn FnMut(&[u8]),
        blocksize: usize,
    ) -> Result<String, FtpError>;

    /// Line-mode retrieval; `callback` receives each line without its terminator.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply or a transfer failure.
    fn retrlines(&mut self, cmd: &str, callback: &mut dyn FnMut(&str)) -> Result<String, FtpError>;

    /// Binary upload of everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply or a transfer failure.
    fn storbinary(&mut self, cmd: &str, reader: &mut dyn Read, blocksize: usize)
        -> Result<String, FtpError>;

    /// Line-mode upload.
    ///
    /// # Errors
    ///
    /// Returns the server's error reply or a transfer failure.
    fn storlines(&mut self, cmd: &str, reader: &mut dyn BufRead) -> Result<String, FtpError>;
}

/// Downloads `ftp://` URLs in one call.
pub trait UrlOpener: Send + Sync {
    /// Fetches the whole resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or cannot be replayed.
    fn open(&self, url: &str) -> Result<Vec<u8>, FtpError>;
}
