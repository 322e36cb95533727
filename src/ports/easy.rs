//! Low-level cURL easy-handle port.
//!
//! Mirrors the option/perform style of libcurl: options are set one by one,
//! `perform` runs the transfer and pushes the body and header bytes into
//! whatever sinks the caller installed.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use super::http::TransportError;

/// Callback receiving transferred bytes; returns how many it consumed.
pub type DataCallback = Box<dyn FnMut(&[u8]) -> usize + Send>;

/// One option set on an easy handle.
pub enum EasyOption {
    /// Target URL.
    Url(String),
    /// Method override, such as `DELETE`.
    CustomRequest(String),
    /// Raw request header lines, `Name: value`.
    HttpHeader(Vec<String>),
    /// Request body; implies `POST` unless a custom method is set.
    PostFields(Vec<u8>),
    /// Body sink as a callback.
    WriteFunction(DataCallback),
    /// Body sink as a writer.
    WriteData(Box<dyn Write + Send>),
    /// Header sink; receives raw header lines including the status line.
    HeaderFunction(DataCallback),
}

impl fmt::Debug for EasyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EasyOption::Url(url) => f.debug_tuple("Url").field(url).finish(),
            EasyOption::CustomRequest(method) => f.debug_tuple("CustomRequest").field(method).finish(),
            EasyOption::HttpHeader(lines) => f.debug_tuple("HttpHeader").field(lines).finish(),
            EasyOption::PostFields(body) => f.debug_tuple("PostFields").field(&body.len()).finish(),
            EasyOption::WriteFunction(_) => f.write_str("WriteFunction(..)"),
            EasyOption::WriteData(_) => f.write_str("WriteData(..)"),
            EasyOption::HeaderFunction(_) => f.write_str("HeaderFunction(..)"),
        }
    }
}

/// A reusable transfer handle.
pub trait EasyTransfer: Send {
    /// Sets one option.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle rejects the option.
    fn setopt(&mut self, option: EasyOption) -> Result<(), TransportError>;

    /// Runs the transfer with the options set so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails or cannot be replayed.
    fn perform(&mut self) -> Result<(), TransportError>;

    /// Status code of the last transfer, 0 before the first one.
    fn response_code(&self) -> u16;

    /// Clears every option, sinks included.
    fn reset(&mut self);
}

/// Where an easy handle delivers bytes.
pub enum Sink {
    /// A caller callback.
    Callback(DataCallback),
    /// A caller writer.
    Writer(Box<dyn Write + Send>),
}

impl Sink {
    /// Hands `data` to the sink. Writer errors are reported as a short count.
    pub fn deliver(&mut self, data: &[u8]) -> usize {
        match self {
            Sink::Callback(callback) => callback(data),
            Sink::Writer(writer) => match writer.write_all(data) {
                Ok(()) => data.len(),
                Err(_) => 0,
            },
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Callback(_) => f.write_str("Sink::Callback(..)"),
            Sink::Writer(_) => f.write_str("Sink::Writer(..)"),
        }
    }
}

/// A cloneable in-memory writer, handy as a `WriteData` target.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Contents decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
