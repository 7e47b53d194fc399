use bastion_mail::EnclaveMail;
use bastion_tee_ra::EncodedKey;
use serde::Serialize;
use serde_with::{hex::Hex, serde_as};

use crate::response::Response;

#[serde_as]
#[derive(Clone, Debug, Serialize)]
pub struct MailDecryptResponse {
    pub topic: String,
    pub sequence_number: u64,
    pub from: Option<String>,
    #[serde_as(as = "Option<Hex>")]
    pub envelope: Option<Vec<u8>>,
    /// Compressed public key of the authenticated sender, if the mail was
    /// sent with one.
    #[serde_as(as = "Option<Hex>")]
    pub sender: Option<Vec<u8>>,
    /// The body as text when it is valid UTF-8.
    pub body: Option<String>,
    #[serde_as(as = "Hex")]
    pub body_hex: Vec<u8>,
}

impl From<EnclaveMail> for MailDecryptResponse {
    fn from(mail: EnclaveMail) -> Self {
        let sender = mail.authenticated_sender().map(EncodedKey::encoded);
        let header = mail.header().clone();
        let body = mail.into_body();
        Self {
            topic: header.topic,
            sequence_number: header.sequence_number,
            from: header.from,
            envelope: header.envelope,
            sender,
            body: String::from_utf8(body.clone()).ok(),
            body_hex: body,
        }
    }
}

impl From<MailDecryptResponse> for Response {
    fn from(response: MailDecryptResponse) -> Self {
        Self::MailDecrypt(response)
    }
}
