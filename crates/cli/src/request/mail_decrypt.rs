use std::path::PathBuf;

use color_eyre::{Report, Result};

use crate::request::{check_file, Request};

#[derive(Clone, Debug)]
pub struct MailDecryptRequest {
    pub key: PathBuf,
    pub mail: PathBuf,
}

impl TryFrom<MailDecryptRequest> for Request {
    type Error = Report;

    fn try_from(request: MailDecryptRequest) -> Result<Request> {
        check_file(&request.key)?;
        check_file(&request.mail)?;
        Ok(Request::MailDecrypt(request))
    }
}
