use bastion_common::EnclaveIdentity;
use bastion_mail::EncryptedMail;
use color_eyre::{Report, Result};

use crate::{
    config::Config,
    handler::{read_hex_key, Handler},
    request::mail_decrypt::MailDecryptRequest,
    response::{mail_decrypt::MailDecryptResponse, Response},
};

impl Handler for MailDecryptRequest {
    type Response = Response;

    fn handle<C: AsRef<Config>>(self, _config: C) -> Result<Self::Response, Report> {
        let identity = EnclaveIdentity::from_bytes(&read_hex_key(&self.key)?)?;
        let mail = EncryptedMail::from(std::fs::read(&self.mail)?);
        let decrypted = identity.decrypt_mail(&mail)?;

        Ok(MailDecryptResponse::from(decrypted).into())
    }
}
