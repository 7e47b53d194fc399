use std::path::Path;

use bastion_mail::DEFAULT_TOPIC;
use bastion_tee_ra::{AttestationVerifier, VerificationError, VerifierConfig};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, ToFigment};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Enable mock SGX mode.
    /// Mock identities can be generated and mock attestations are accepted.
    #[serde(default)]
    pub mock_sgx: bool,

    /// How enclave attestations are checked
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Topic used for mail when none is given on the command line
    #[serde(default = "default_topic")]
    pub default_topic: String,
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mock_sgx: false,
            verifier: VerifierConfig::default(),
            default_topic: default_topic(),
        }
    }
}

impl AsRef<Config> for Config {
    fn as_ref(&self) -> &Config {
        self
    }
}

impl Config {
    /// Defaults, then the file at `path`, then `BASTION_` environment
    /// variables, then the command line.
    pub fn figment(path: &Path, args: &Cli) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("BASTION_").split("__"))
            .merge(Serialized::defaults(args.overrides()))
            .merge(args.command.to_figment())
    }

    /// The verifier described by this configuration. Mock SGX mode implies
    /// accepting mock attestations.
    pub fn verifier(&self) -> Result<AttestationVerifier, VerificationError> {
        let config = VerifierConfig {
            allow_mock: self.verifier.allow_mock || self.mock_sgx,
            ..self.verifier.clone()
        };
        AttestationVerifier::try_from(&config)
    }
}
