//! Easy-handle transfers performed with the blocking reqwest client.

use reqwest::Method;

use super::http::convert_headers;
use crate::cassette::format::Status;
use crate::normalize::header_block;
use crate::ports::easy::{EasyOption, EasyTransfer, Sink};
use crate::ports::http::TransportError;

/// An [`EasyTransfer`] that runs each `perform` as one reqwest request.
///
/// Without a write sink the body is discarded.
#[derive(Debug, Default)]
pub struct ReqwestEasy {
    client: reqwest::blocking::Client,
    url: Option<String>,
    custom_method: Option<String>,
    header_lines: Vec<String>,
    post_fields: Option<Vec<u8>>,
    write: Option<Sink>,
    header: Option<Sink>,
    response_code: u16,
}

impl ReqwestEasy {
    /// A fresh handle with no options set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn method(&self) -> Result<Method, TransportError> {
        let name = match (&self.custom_method, &self.post_fields) {
            (Some(custom), _) => custom.as_str(),
            (None, Some(_)) => "POST",
            (None, None) => "GET",
        };
        Method::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Other(format!("Invalid method {name}: {e}")))
    }
}

impl EasyTransfer for ReqwestEasy {
    fn setopt(&mut self, option: EasyOption) -> Result<(), TransportError> {
        match option {
            EasyOption::Url(url) => self.url = Some(url),
            EasyOption::CustomRequest(method) => self.custom_method = Some(method),
            EasyOption::HttpHeader(lines) => self.header_lines = lines,
            EasyOption::PostFields(body) => self.post_fields = Some(body),
            EasyOption::WriteFunction(callback) => self.write = Some(Sink::Callback(callback)),
            EasyOption::WriteData(writer) => self.write = Some(Sink::Writer(writer)),
            EasyOption::HeaderFunction(callback) => self.header = Some(Sink::Callback(callback)),
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), TransportError> {
        let url = self.url.clone().ok_or_else(|| TransportError::Other("No URL set".into()))?;
        let mut builder = self.client.request(self.method()?, url.as_str());
        for line in &self.header_lines {
            if let Some((name, value)) = line.split_once(':') {
                builder = builder.header(name.trim(), value.trim());
            }
        }
        if let Some(body) = &self.post_fields {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status();
        let headers = convert_headers(response.headers());
        let body = response.bytes()?;
        self.response_code = status.as_u16();

        if let Some(sink) = self.header.as_mut() {
            let line = Status {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            };
            sink.deliver(&header_block(&line, &headers));
        }
        if let Some(sink) = self.write.as_mut() {
            sink.deliver(&body);
        }
        Ok(())
    }

    fn response_code(&self) -> u16 {
        self.response_code
    }

    fn reset(&mut self) {
        self.url = None;
        self.custom_method = None;
        self.header_lines.clear();
        self.post_fields = None;
        self.write = None;
        self.header = None;
        self.response_code = 0;
    }
}
