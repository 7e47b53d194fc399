use serde::Serialize;

use crate::response::{
    eii_inspect::EiiInspectResponse, eii_mock::EiiMockResponse, mail_decrypt::MailDecryptResponse,
    mail_encrypt::MailEncryptResponse, mail_header::MailHeaderResponse,
};

pub mod eii_inspect;
pub mod eii_mock;
pub mod mail_decrypt;
pub mod mail_encrypt;
pub mod mail_header;

#[derive(Clone, Debug, Serialize)]
pub enum Response {
    EiiInspect(EiiInspectResponse),
    EiiMock(EiiMockResponse),
    MailHeader(MailHeaderResponse),
    MailEncrypt(MailEncryptResponse),
    MailDecrypt(MailDecryptResponse),
}
