use std::path::PathBuf;

use color_eyre::{Report, Result};

use crate::request::{check_file, Request};

#[derive(Clone, Debug)]
pub struct EiiInspectRequest {
    pub file: PathBuf,
}

impl TryFrom<EiiInspectRequest> for Request {
    type Error = Report;

    fn try_from(request: EiiInspectRequest) -> Result<Request> {
        check_file(&request.file)?;
        Ok(Request::EiiInspect(request))
    }
}
