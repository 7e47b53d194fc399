use bastion_mail::EnclaveMailHeader;
use serde::Serialize;
use serde_with::{hex::Hex, serde_as};

use crate::response::Response;

/// Header fields as read, before any authentication.
#[serde_as]
#[derive(Clone, Debug, Serialize)]
pub struct MailHeaderResponse {
    pub topic: String,
    pub sequence_number: u64,
    pub from: Option<String>,
    #[serde_as(as = "Option<Hex>")]
    pub envelope: Option<Vec<u8>>,
    pub size: usize,
}

impl MailHeaderResponse {
    pub fn new(header: EnclaveMailHeader, size: usize) -> Self {
        Self {
            topic: header.topic,
            sequence_number: header.sequence_number,
            from: header.from,
            envelope: header.envelope,
            size,
        }
    }
}

impl From<MailHeaderResponse> for Response {
    fn from(response: MailHeaderResponse) -> Self {
        Self::MailHeader(response)
    }
}
