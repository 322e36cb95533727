//! Replaying adapter for the easy-handle port.

use std::sync::{Arc, Mutex};

use super::replay_response;
use crate::cassette::replayer::CassetteReplayer;
use crate::normalize::header_block;
use crate::ports::easy::{EasyOption, EasyTransfer, Sink};
use crate::ports::http::TransportError;

/// Serves easy-handle transfers from a cassette, writing the stored header
/// block and body into the caller's sinks.
pub struct ReplayingEasyTransfer {
    replayer: Arc<Mutex<CassetteReplayer>>,
    url: Option<String>,
    write: Option<Sink>,
    header: Option<Sink>,
    response_code: u16,
}

impl ReplayingEasyTransfer {
    /// Creates a replaying handle.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer, url: None, write: None, header: None, response_code: 0 }
    }
}

impl EasyTransfer for ReplayingEasyTransfer {
    fn setopt(&mut self, option: EasyOption) -> Result<(), TransportError> {
        match option {
            EasyOption::Url(url) => self.url = Some(url),
            EasyOption::WriteFunction(callback) => self.write = Some(Sink::Callback(callback)),
            EasyOption::WriteData(writer) => self.write = Some(Sink::Writer(writer)),
            EasyOption::HeaderFunction(callback) => self.header = Some(Sink::Callback(callback)),
            EasyOption::CustomRequest(_) | EasyOption::HttpHeader(_) | EasyOption::PostFields(_) => {}
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), TransportError> {
        let url = self.url.as_deref().ok_or_else(|| TransportError::Other("No URL set".into()))?;
        let (interaction, response) = replay_response(&self.replayer, url)?;
        self.response_code = response.status;

        if let Some(sink) = self.header.as_mut() {
            sink.deliver(&header_block(&interaction.response.status, &response.headers));
        }
        if let Some(sink) = self.write.as_mut() {
            sink.deliver(&response.body);
        }
        Ok(())
    }

    fn response_code(&self) -> u16 {
        self.response_code
    }

    fn reset(&mut self) {
        self.url = None;
        self.write = None;
        self.header = None;
        self.response_code = 0;
    }
}
