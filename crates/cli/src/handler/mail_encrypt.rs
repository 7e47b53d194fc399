use bastion_common::EnclaveInstanceInfo;
use bastion_mail::MutableMail;
use color_eyre::{Report, Result};
use k256::SecretKey;
use tracing::info;

use crate::{
    config::Config,
    error::Error,
    handler::{read_hex_key, Handler},
    request::mail_encrypt::MailEncryptRequest,
    response::{mail_encrypt::MailEncryptResponse, Response},
};

impl Handler for MailEncryptRequest {
    type Response = Response;

    fn handle<C: AsRef<Config>>(self, config: C) -> Result<Self::Response, Report> {
        let config = config.as_ref();
        let eii = EnclaveInstanceInfo::deserialize(&std::fs::read(&self.eii)?, &config.verifier()?)?;

        let sender = self
            .sender_key
            .as_deref()
            .map(|path| {
                let bytes = read_hex_key(path)?;
                SecretKey::from_slice(&bytes).map_err(|e| {
                    Report::from(Error::InvalidKey(path.display().to_string(), e.to_string()))
                })
            })
            .transpose()?;

        let mut mail = MutableMail::new(std::fs::read(&self.body)?, *eii.encryption_key(), sender);
        mail.set_topic(config.default_topic.clone())?;
        mail.set_sequence_number(self.sequence);
        let encrypted = mail.encrypt()?;

        std::fs::write(&self.out, encrypted.as_bytes())?;
        info!(
            "Encrypted mail for enclave {} written to {}",
            eii.measurement(),
            self.out.display()
        );

        Ok(MailEncryptResponse {
            out: self.out,
            size: encrypted.len(),
            topic: mail.topic().to_string(),
            sequence_number: mail.sequence_number(),
        }
        .into())
    }
}
