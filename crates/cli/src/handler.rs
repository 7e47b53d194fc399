use std::path::Path;

use color_eyre::{Report, Result};

use crate::{config::Config, error::Error, request::Request, response::Response};

// commands
pub mod eii_inspect;
pub mod eii_mock;
pub mod mail_decrypt;
pub mod mail_encrypt;
pub mod mail_header;

pub trait Handler {
    type Response;

    fn handle<C: AsRef<Config>>(self, config: C) -> Result<Self::Response, Report>;
}

impl Handler for Request {
    type Response = Response;

    fn handle<C: AsRef<Config>>(self, config: C) -> Result<Self::Response, Report> {
        match self {
            Request::EiiInspect(request) => request.handle(config),
            Request::EiiMock(request) => request.handle(config),
            Request::MailHeader(request) => request.handle(config),
            Request::MailEncrypt(request) => request.handle(config),
            Request::MailDecrypt(request) => request.handle(config),
        }
    }
}

/// Reads a key file holding hex, ignoring surrounding whitespace.
pub(crate) fn read_hex_key(path: &Path) -> Result<Vec<u8>> {
    let text = std::fs::read_to_string(path)?;
    let bytes = hex::decode(text.trim())
        .map_err(|e| Error::InvalidKey(path.display().to_string(), e.to_string()))?;
    Ok(bytes)
}
