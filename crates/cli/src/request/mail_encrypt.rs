use std::path::PathBuf;

use color_eyre::{Report, Result};

use crate::request::{check_file, Request};

#[derive(Clone, Debug)]
pub struct MailEncryptRequest {
    pub eii: PathBuf,
    pub body: PathBuf,
    pub sequence: u64,
    pub sender_key: Option<PathBuf>,
    pub out: PathBuf,
}

impl TryFrom<MailEncryptRequest> for Request {
    type Error = Report;

    fn try_from(request: MailEncryptRequest) -> Result<Request> {
        check_file(&request.eii)?;
        check_file(&request.body)?;
        if let Some(sender_key) = &request.sender_key {
            check_file(sender_key)?;
        }
        Ok(Request::MailEncrypt(request))
    }
}
