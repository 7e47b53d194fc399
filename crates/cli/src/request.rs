use std::path::{Path, PathBuf};

use bastion_tee_ra::Measurement;
use color_eyre::{Report, Result};

use crate::{
    cli::{Command, EiiCommand, MailCommand},
    error::Error,
    request::{
        eii_inspect::EiiInspectRequest, eii_mock::EiiMockRequest, mail_decrypt::MailDecryptRequest,
        mail_encrypt::MailEncryptRequest, mail_header::MailHeaderRequest,
    },
};

pub mod eii_inspect;
pub mod eii_mock;
pub mod mail_decrypt;
pub mod mail_encrypt;
pub mod mail_header;

#[derive(Clone, Debug)]
pub enum Request {
    EiiInspect(EiiInspectRequest),
    EiiMock(EiiMockRequest),
    MailHeader(MailHeaderRequest),
    MailEncrypt(MailEncryptRequest),
    MailDecrypt(MailDecryptRequest),
}

impl TryFrom<Command> for Request {
    type Error = Report;

    fn try_from(cmd: Command) -> Result<Self, Self::Error> {
        match cmd {
            Command::Eii { eii_command } => eii_command.try_into(),
            Command::Mail { mail_command } => mail_command.try_into(),
        }
    }
}

impl TryFrom<EiiCommand> for Request {
    type Error = Report;

    fn try_from(cmd: EiiCommand) -> Result<Request> {
        match cmd {
            EiiCommand::Inspect(args) => EiiInspectRequest { file: args.file }.try_into(),
            EiiCommand::Mock(args) => {
                let measurement = args
                    .measurement
                    .as_deref()
                    .map(parse_measurement)
                    .transpose()?
                    .unwrap_or_default();
                let key_out = args.key_out.unwrap_or_else(|| default_key_path(&args.out));

                Ok(EiiMockRequest {
                    out: args.out,
                    key_out,
                    measurement,
                }
                .into())
            }
        }
    }
}

impl TryFrom<MailCommand> for Request {
    type Error = Report;

    fn try_from(cmd: MailCommand) -> Result<Request> {
        match cmd {
            MailCommand::Header(args) => MailHeaderRequest { file: args.file }.try_into(),
            MailCommand::Encrypt(args) => MailEncryptRequest {
                eii: args.eii,
                body: args.body,
                sequence: args.sequence,
                sender_key: args.sender_key,
                out: args.out,
            }
            .try_into(),
            MailCommand::Decrypt(args) => MailDecryptRequest {
                key: args.key,
                mail: args.mail,
            }
            .try_into(),
        }
    }
}

pub(crate) fn check_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::PathNotFile(path.display().to_string()).into());
    }
    Ok(())
}

fn parse_measurement(hex_str: &str) -> Result<Measurement> {
    let bytes: [u8; 32] = hex::decode(hex_str)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| Error::InvalidMeasurement(hex_str.to_string()))?;
    Ok(Measurement(bytes))
}

pub(crate) fn default_key_path(out: &Path) -> PathBuf {
    out.with_extension("key")
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn request(args: &[&str]) -> Result<Request> {
        Cli::try_parse_from(args).unwrap().command.try_into()
    }

    #[test]
    fn eii_mock_defaults() {
        let parsed = request(&["bastion", "eii", "mock", "--out", "dir/enclave.eii"]).unwrap();
        let Request::EiiMock(mock) = parsed else {
            panic!("expected an eii mock request");
        };
        assert_eq!(mock.out, PathBuf::from("dir/enclave.eii"));
        assert_eq!(mock.key_out, PathBuf::from("dir/enclave.key"));
        assert_eq!(mock.measurement, Measurement::default());
    }

    #[test]
    fn eii_mock_measurement_must_be_32_bytes() {
        let hex = "ab".repeat(32);
        let parsed = request(&["bastion", "eii", "mock", "--out", "e", "--measurement", &hex]);
        let Ok(Request::EiiMock(mock)) = parsed else {
            panic!("expected an eii mock request");
        };
        assert_eq!(mock.measurement, Measurement([0xab; 32]));

        let err = request(&["bastion", "eii", "mock", "--out", "e", "--measurement", "abcd"])
            .unwrap_err();
        assert!(err.to_string().contains("Invalid measurement"));
    }

    #[test]
    fn missing_input_files_are_rejected() {
        let err = request(&["bastion", "mail", "header", "/does/not/exist"]).unwrap_err();
        assert_eq!(err.to_string(), "Specified file `/does/not/exist` does not exist");
        assert!(request(&["bastion", "eii", "inspect", "/does/not/exist"]).is_err());
    }

    #[test]
    fn mail_encrypt_request() {
        let dir = tempfile::tempdir().unwrap();
        let eii = dir.path().join("enclave.eii");
        let body = dir.path().join("body.txt");
        std::fs::write(&eii, b"EII").unwrap();
        std::fs::write(&body, b"hello").unwrap();

        let parsed = request(&[
            "bastion",
            "mail",
            "encrypt",
            "--eii",
            eii.to_str().unwrap(),
            "--body",
            body.to_str().unwrap(),
            "--sequence",
            "4",
            "--out",
            "mail.bin",
        ]);
        let Ok(Request::MailEncrypt(encrypt)) = parsed else {
            panic!("expected a mail encrypt request");
        };
        assert_eq!(encrypt.sequence, 4);
        assert_eq!(encrypt.sender_key, None);
        assert_eq!(encrypt.out, PathBuf::from("mail.bin"));
    }

    #[test]
    fn mail_decrypt_needs_key_and_mail() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("enclave.key");
        std::fs::write(&key, "00").unwrap();
        let mail = dir.path().join("mail.bin");

        let args = [
            "bastion",
            "mail",
            "decrypt",
            "--key",
            key.to_str().unwrap(),
            mail.to_str().unwrap(),
        ];

        assert!(request(&args).is_err());
        std::fs::write(&mail, b"").unwrap();
        assert!(matches!(request(&args), Ok(Request::MailDecrypt(_))));
    }
}
