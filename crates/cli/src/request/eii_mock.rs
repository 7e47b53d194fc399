use std::path::PathBuf;

use bastion_tee_ra::Measurement;

use crate::request::Request;

#[derive(Clone, Debug)]
pub struct EiiMockRequest {
    pub out: PathBuf,
    pub key_out: PathBuf,
    pub measurement: Measurement,
}

impl From<EiiMockRequest> for Request {
    fn from(request: EiiMockRequest) -> Self {
        Self::EiiMock(request)
    }
}
