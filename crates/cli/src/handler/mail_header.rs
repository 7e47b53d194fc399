use bastion_mail::EncryptedMail;
use color_eyre::{Report, Result};

use crate::{
    config::Config,
    handler::Handler,
    request::mail_header::MailHeaderRequest,
    response::{mail_header::MailHeaderResponse, Response},
};

impl Handler for MailHeaderRequest {
    type Response = Response;

    fn handle<C: AsRef<Config>>(self, _config: C) -> Result<Self::Response, Report> {
        let mail = EncryptedMail::from(std::fs::read(&self.file)?);
        let header = mail.header()?;

        Ok(MailHeaderResponse::new(header, mail.len()).into())
    }
}
