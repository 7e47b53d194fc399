use std::path::PathBuf;

use serde::Serialize;

use crate::response::Response;

#[derive(Clone, Debug, Serialize)]
pub struct MailEncryptResponse {
    pub out: PathBuf,
    pub size: usize,
    pub topic: String,
    pub sequence_number: u64,
}

impl From<MailEncryptResponse> for Response {
    fn from(response: MailEncryptResponse) -> Self {
        Self::MailEncrypt(response)
    }
}
