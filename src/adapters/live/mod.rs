//! Live adapters for real external interactions.

pub mod clock;
pub mod easy;
pub mod http;

pub use clock::LiveClock;
pub use easy::ReqwestEasy;
pub use http::{ReqwestAsyncTransport, ReqwestTransport};
