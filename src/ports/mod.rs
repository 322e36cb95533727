//! Port traits defining external boundaries.
//!
//! Each trait is a surface a test can route through a session: plain and
//! awaitable HTTP transports, the low-level cURL easy handle, FTP clients,
//! `ftp://` URL openers and the clock. Implementations live in
//! `src/adapters/`.

pub mod clock;
pub mod easy;
pub mod ftp;
pub mod http;

pub use clock::Clock;
pub use easy::{DataCallback, EasyOption, EasyTransfer, SharedBuffer, Sink};
pub use ftp::{FtpClient, FtpError, UrlOpener};
pub use http::{
    AsyncHttpTransport, HttpFuture, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
