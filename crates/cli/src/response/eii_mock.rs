use std::path::PathBuf;

use bastion_tee_ra::Measurement;
use serde::Serialize;

use crate::response::Response;

#[derive(Clone, Debug, Serialize)]
pub struct EiiMockResponse {
    pub eii_file: PathBuf,
    pub key_file: PathBuf,
    pub measurement: Measurement,
    pub encryption_key: String,
}

impl From<EiiMockResponse> for Response {
    fn from(response: EiiMockResponse) -> Self {
        Self::EiiMock(response)
    }
}
