use std::path::PathBuf;

use color_eyre::{Report, Result};

use crate::request::{check_file, Request};

#[derive(Clone, Debug)]
pub struct MailHeaderRequest {
    pub file: PathBuf,
}

impl TryFrom<MailHeaderRequest> for Request {
    type Error = Report;

    fn try_from(request: MailHeaderRequest) -> Result<Request> {
        check_file(&request.file)?;
        Ok(Request::MailHeader(request))
    }
}
