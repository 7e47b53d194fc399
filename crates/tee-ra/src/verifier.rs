//! Turns an [`Attestation`] into a trusted measurement, security info and
//! report data.

use log::{debug, warn};
use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::{
    attestation::Attestation,
    error::VerificationError,
    quote::{EnclaveInfo, EnclaveMode, Measurement, QuoteBody, ReportData},
    report::{QuoteStatus, ReportBody, SignedReport},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecuritySummary {
    /// Genuine, up-to-date platform running a release enclave.
    Secure,
    /// Genuine platform that is missing security updates.
    Stale,
    /// No hardware guarantees at all (debug or mock enclave).
    Insecure,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    pub summary: SecuritySummary,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisory_ids: Vec<String>,
}

/// The result of a successful verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedQuote {
    pub measurement: Measurement,
    pub enclave_info: EnclaveInfo,
    pub security_info: SecurityInfo,
    pub report_data: ReportData,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// SEC1-encoded P-256 key of the attestation service root, as hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_root: Option<String>,

    /// Accept unsigned mock attestations (no SGX hardware involved).
    #[serde(default)]
    pub allow_mock: bool,
}

#[derive(Clone, Debug)]
pub struct AttestationVerifier {
    trusted_root: Option<VerifyingKey>,
    allow_mock: bool,
}

impl AttestationVerifier {
    pub fn new(trusted_root: Option<VerifyingKey>, allow_mock: bool) -> Self {
        Self {
            trusted_root,
            allow_mock,
        }
    }

    pub fn allows_mock(&self) -> bool {
        self.allow_mock
    }

    pub fn verify(&self, attestation: &Attestation) -> Result<VerifiedQuote, VerificationError> {
        match attestation {
            Attestation::Signed(report) => self.verify_signed(report),
            Attestation::Mock { quote_body } => self.verify_mock(quote_body),
        }
    }

    fn verify_signed(&self, signed: &SignedReport) -> Result<VerifiedQuote, VerificationError> {
        let root = self
            .trusted_root
            .as_ref()
            .ok_or(VerificationError::UntrustedSignature)?;

        let leaf = verify_chain(root, signed)?;
        let signature = Signature::from_der(&signed.signature)
            .map_err(|_| VerificationError::UntrustedSignature)?;
        leaf.verify(&signed.report, &signature)
            .map_err(|_| VerificationError::UntrustedSignature)?;
        debug!("Attestation report signature verified");

        let body: ReportBody = serde_json::from_slice(&signed.report)
            .map_err(|e| VerificationError::MalformedQuote(e.to_string()))?;
        let quote = QuoteBody::try_from(body.isv_enclave_quote_body.as_slice())?;
        let status: QuoteStatus = body
            .isv_enclave_quote_status
            .parse()
            .map_err(VerificationError::UnknownQuoteStatus)?;

        let (mode, security_info) = if quote.is_debug() {
            (EnclaveMode::Debug, debug_security_info(body.advisory_ids))
        } else {
            (
                EnclaveMode::Release,
                status_security_info(status, body.advisory_ids)?,
            )
        };

        if security_info.summary != SecuritySummary::Secure {
            warn!(
                "Enclave {} verified with degraded trust: {}",
                quote.mr_enclave(),
                security_info.reason
            );
        }

        Ok(VerifiedQuote {
            measurement: quote.mr_enclave(),
            enclave_info: quote.enclave_info(mode),
            security_info,
            report_data: quote.report_data(),
        })
    }

    fn verify_mock(&self, quote_body: &[u8]) -> Result<VerifiedQuote, VerificationError> {
        if !self.allow_mock {
            return Err(VerificationError::MockNotAllowed);
        }
        let quote = QuoteBody::try_from(quote_body)?;
        debug!("Accepting mock attestation for {}", quote.mr_enclave());

        Ok(VerifiedQuote {
            measurement: quote.mr_enclave(),
            enclave_info: quote.enclave_info(EnclaveMode::Mock),
            security_info: SecurityInfo {
                summary: SecuritySummary::Insecure,
                reason: "Mock enclave; no hardware protection".to_string(),
                advisory_ids: vec![],
            },
            report_data: quote.report_data(),
        })
    }
}

impl TryFrom<&VerifierConfig> for AttestationVerifier {
    type Error = VerificationError;

    fn try_from(config: &VerifierConfig) -> Result<Self, Self::Error> {
        let trusted_root = config
            .trusted_root
            .as_deref()
            .map(|root| {
                let bytes = hex::decode(root)
                    .map_err(|e| VerificationError::InvalidTrustedRoot(e.to_string()))?;
                VerifyingKey::from_sec1_bytes(&bytes)
                    .map_err(|e| VerificationError::InvalidTrustedRoot(e.to_string()))
            })
            .transpose()?;
        Ok(Self::new(trusted_root, config.allow_mock))
    }
}

/// Walks the chain from `root`, each link signed by its predecessor, and
/// returns the key that is expected to have signed the report.
fn verify_chain(
    root: &VerifyingKey,
    signed: &SignedReport,
) -> Result<VerifyingKey, VerificationError> {
    let mut issuer = root.clone();
    for link in &signed.chain {
        let subject = VerifyingKey::from_sec1_bytes(&link.public_key)
            .map_err(|_| VerificationError::UntrustedSignature)?;
        let signature = Signature::from_der(&link.signature)
            .map_err(|_| VerificationError::UntrustedSignature)?;
        issuer
            .verify(&link.public_key, &signature)
            .map_err(|_| VerificationError::UntrustedSignature)?;
        issuer = subject;
    }
    Ok(issuer)
}

fn debug_security_info(advisory_ids: Vec<String>) -> SecurityInfo {
    SecurityInfo {
        summary: SecuritySummary::Insecure,
        reason: "Enclave is running in debug mode and its memory can be inspected".to_string(),
        advisory_ids,
    }
}

fn status_security_info(
    status: QuoteStatus,
    advisory_ids: Vec<String>,
) -> Result<SecurityInfo, VerificationError> {
    if status == QuoteStatus::SignatureInvalid {
        return Err(VerificationError::UntrustedSignature);
    }
    if status.is_revoked() {
        return Err(VerificationError::Revoked(status));
    }
    let (summary, reason) = if status.is_stale() {
        (
            SecuritySummary::Stale,
            format!("Platform is missing security updates ({status})"),
        )
    } else {
        (SecuritySummary::Secure, "Quote status OK".to_string())
    };
    Ok(SecurityInfo {
        summary,
        reason,
        advisory_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mock::{MockAttestor, ReportIssuer},
        report::ChainLink,
    };

    const REPORT_DATA: ReportData = [3u8; 64];

    fn quote(debug: bool) -> QuoteBody {
        QuoteBody::new(Measurement([1u8; 32]), [2u8; 32], 1, 1, debug, REPORT_DATA)
    }

    #[test]
    fn ok_status_is_secure() {
        let issuer = ReportIssuer::generate(2);
        let attestation = issuer.issue(&quote(false), QuoteStatus::Ok, vec![]).unwrap();

        let verified = issuer.verifier().verify(&attestation).unwrap();
        assert_eq!(verified.measurement, Measurement([1u8; 32]));
        assert_eq!(verified.report_data, REPORT_DATA);
        assert_eq!(verified.security_info.summary, SecuritySummary::Secure);
        assert_eq!(verified.enclave_info.enclave_mode, EnclaveMode::Release);
    }

    #[test]
    fn out_of_date_platform_is_stale_not_an_error() {
        let issuer = ReportIssuer::generate(1);
        let advisories = vec!["INTEL-SA-00334".to_string()];
        let attestation = issuer
            .issue(&quote(false), QuoteStatus::GroupOutOfDate, advisories.clone())
            .unwrap();

        let verified = issuer.verifier().verify(&attestation).unwrap();
        assert_eq!(verified.security_info.summary, SecuritySummary::Stale);
        assert_eq!(verified.security_info.advisory_ids, advisories);
    }

    #[test]
    fn revoked_platform_is_rejected() {
        let issuer = ReportIssuer::generate(1);
        let attestation = issuer
            .issue(&quote(false), QuoteStatus::KeyRevoked, vec![])
            .unwrap();
        assert_eq!(
            issuer.verifier().verify(&attestation),
            Err(VerificationError::Revoked(QuoteStatus::KeyRevoked))
        );
    }

    #[test]
    fn invalid_signature_status_is_untrusted() {
        let issuer = ReportIssuer::generate(1);
        let attestation = issuer
            .issue(&quote(false), QuoteStatus::SignatureInvalid, vec![])
            .unwrap();
        assert_eq!(
            issuer.verifier().verify(&attestation),
            Err(VerificationError::UntrustedSignature)
        );
    }

    #[test]
    fn debug_enclave_is_insecure() {
        let issuer = ReportIssuer::generate(1);
        let attestation = issuer.issue(&quote(true), QuoteStatus::Ok, vec![]).unwrap();

        let verified = issuer.verifier().verify(&attestation).unwrap();
        assert_eq!(verified.security_info.summary, SecuritySummary::Insecure);
        assert_eq!(verified.enclave_info.enclave_mode, EnclaveMode::Debug);
    }

    #[test]
    fn wrong_root_is_untrusted() {
        let issuer = ReportIssuer::generate(2);
        let other = ReportIssuer::generate(2);
        let attestation = issuer.issue(&quote(false), QuoteStatus::Ok, vec![]).unwrap();

        assert_eq!(
            other.verifier().verify(&attestation),
            Err(VerificationError::UntrustedSignature)
        );
        assert_eq!(
            AttestationVerifier::new(None, true).verify(&attestation),
            Err(VerificationError::UntrustedSignature)
        );
    }

    #[test]
    fn tampered_report_is_untrusted() {
        let issuer = ReportIssuer::generate(1);
        let Attestation::Signed(mut report) =
            issuer.issue(&quote(false), QuoteStatus::Ok, vec![]).unwrap()
        else {
            unreachable!("issuer produces signed reports")
        };
        let last = report.report.len() - 2;
        report.report[last] ^= 0x01;

        assert_eq!(
            issuer.verifier().verify(&Attestation::Signed(report)),
            Err(VerificationError::UntrustedSignature)
        );
    }

    #[test]
    fn broken_chain_link_is_untrusted() {
        let issuer = ReportIssuer::generate(2);
        let Attestation::Signed(mut report) =
            issuer.issue(&quote(false), QuoteStatus::Ok, vec![]).unwrap()
        else {
            unreachable!("issuer produces signed reports")
        };
        report.chain[0] = ChainLink {
            public_key: report.chain[1].public_key.clone(),
            signature: report.chain[0].signature.clone(),
        };

        assert_eq!(
            issuer.verifier().verify(&Attestation::Signed(report)),
            Err(VerificationError::UntrustedSignature)
        );
    }

    #[test]
    fn mock_attestation_requires_opt_in() {
        let attestor = MockAttestor::new(Measurement([8u8; 32]));
        let attestation = attestor.mock_attestation(REPORT_DATA);

        assert_eq!(
            AttestationVerifier::new(None, false).verify(&attestation),
            Err(VerificationError::MockNotAllowed)
        );

        let verified = AttestationVerifier::new(None, true)
            .verify(&attestation)
            .unwrap();
        assert_eq!(verified.measurement, Measurement([8u8; 32]));
        assert_eq!(verified.security_info.summary, SecuritySummary::Insecure);
        assert_eq!(verified.enclave_info.enclave_mode, EnclaveMode::Mock);
    }

    #[test]
    fn short_mock_quote_is_malformed() {
        let attestation = Attestation::Mock {
            quote_body: vec![0u8; 100],
        };
        assert!(matches!(
            AttestationVerifier::new(None, true).verify(&attestation),
            Err(VerificationError::MalformedQuote(_))
        ));
    }

    #[test]
    fn config_with_bad_root_is_rejected() {
        let config = VerifierConfig {
            trusted_root: Some("zz".to_string()),
            allow_mock: false,
        };
        assert!(matches!(
            AttestationVerifier::try_from(&config),
            Err(VerificationError::InvalidTrustedRoot(_))
        ));
    }
}
