use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figment::{providers::Serialized, Figment};
use serde::{Deserialize, Serialize};
use tracing::metadata::LevelFilter;

#[derive(clap::Args, Debug, Clone, Serialize)]
pub struct Verbosity {
    /// Increase verbosity, can be repeated up to 2 times
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Verbosity {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser, Serialize)]
#[command(name = "bastion", version, long_about = None)]
pub struct Cli {
    /// Increase log verbosity
    #[command(flatten)]
    pub verbose: Verbosity,

    /// Enable mock SGX mode.
    /// Mock attestations are generated and accepted; nothing produced this way is trustworthy.
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub mock_sgx: bool,

    /// Path to the configuration file
    #[arg(long, env = "BASTION_CONFIG", default_value = "bastion.toml")]
    #[serde(skip)]
    pub config: PathBuf,

    #[command(flatten)]
    pub verifier: VerifierArgs,

    /// Main command
    #[command(subcommand)]
    pub command: Command,
}

fn is_false(b: &bool) -> bool {
    !(*b)
}

/// Overrides for the `[verifier]` configuration table.
#[derive(clap::Args, Debug, Clone, Default, Serialize)]
pub struct VerifierArgs {
    /// Hex SEC1 P-256 key of the attestation service root
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted_root: Option<String>,

    /// Accept unsigned mock attestations
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub allow_mock: bool,
}

impl VerifierArgs {
    fn is_empty(&self) -> bool {
        self.trusted_root.is_none() && !self.allow_mock
    }
}

/// Serializes the verifier overrides under the `verifier` key, and only when
/// at least one was given so they do not mask the configuration file.
#[derive(Serialize)]
pub struct CliOverrides<'a> {
    #[serde(skip_serializing_if = "is_false")]
    mock_sgx: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verifier: Option<&'a VerifierArgs>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides<'_> {
        CliOverrides {
            mock_sgx: self.mock_sgx,
            verifier: (!self.verifier.is_empty()).then_some(&self.verifier),
        }
    }
}

#[derive(Debug, Subcommand, Serialize, Clone)]
pub enum Command {
    /// Subcommands for enclave instance info
    Eii {
        #[command(subcommand)]
        eii_command: EiiCommand,
    },

    /// Subcommands for enclave mail
    Mail {
        #[command(subcommand)]
        mail_command: MailCommand,
    },
}

#[derive(Debug, Clone, Subcommand, Serialize)]
pub enum EiiCommand {
    /// Verify a serialized enclave instance info and print its summary
    Inspect(EiiInspectArgs),
    /// Generate a mock enclave identity (mock SGX only)
    Mock(EiiMockArgs),
}

#[derive(Debug, Clone, Subcommand, Serialize)]
pub enum MailCommand {
    /// Print the unauthenticated header of a mail
    Header(MailHeaderArgs),
    /// Encrypt a mail to the enclave described by an instance info file
    Encrypt(MailEncryptArgs),
    /// Decrypt a mail with an enclave identity key file
    Decrypt(MailDecryptArgs),
}

#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct EiiInspectArgs {
    /// Serialized enclave instance info
    pub file: PathBuf,
}

#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct EiiMockArgs {
    /// Where to write the enclave instance info
    #[arg(long)]
    pub out: PathBuf,

    /// Where to write the identity key, defaults to the output path with a `.key` extension
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_out: Option<PathBuf>,

    /// MRENCLAVE to report, as 32 hex-encoded bytes
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
}

#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct MailHeaderArgs {
    /// Encrypted mail
    pub file: PathBuf,
}

#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct MailEncryptArgs {
    /// Serialized enclave instance info of the recipient
    #[arg(long)]
    pub eii: PathBuf,

    /// Mail topic, defaults to `default_topic` from the configuration
    #[arg(long)]
    #[serde(rename = "default_topic", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// File holding the mail body
    #[arg(long)]
    pub body: PathBuf,

    /// Sequence number to put in the header
    #[arg(long, default_value_t = 0)]
    pub sequence: u64,

    /// Authenticate the mail with this hex-encoded secret key
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_key: Option<PathBuf>,

    /// Where to write the encrypted mail
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct MailDecryptArgs {
    /// Enclave identity key file, as written by `eii mock`
    #[arg(long)]
    pub key: PathBuf,

    /// Encrypted mail
    pub mail: PathBuf,
}

pub trait ToFigment {
    fn to_figment(&self) -> Figment;
}

impl ToFigment for Command {
    fn to_figment(&self) -> Figment {
        match self {
            Command::Mail {
                mail_command: MailCommand::Encrypt(args),
            } => Figment::from(Serialized::defaults(args)),
            _ => Figment::default(),
        }
    }
}
