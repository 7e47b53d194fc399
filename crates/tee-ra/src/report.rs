use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// The JSON body of an attestation-service report about a single quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBody {
    pub id: String,
    pub timestamp: String,
    pub version: u64,
    #[serde(rename = "isvEnclaveQuoteStatus")]
    pub isv_enclave_quote_status: String,
    #[serde(rename = "advisoryIDs", default)]
    pub advisory_ids: Vec<String>,
    #[serde(rename = "advisoryURL", default, skip_serializing_if = "Option::is_none")]
    pub advisory_url: Option<String>,
    #[serde(rename = "isvEnclaveQuoteBody", with = "hex::serde")]
    pub isv_enclave_quote_body: Vec<u8>,
}

/// One certificate-like link: a P-256 key (SEC1) signed by the previous
/// link's key, or by the trusted root for the first link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A report as delivered by the attestation service: the exact JSON bytes,
/// a DER ECDSA signature over them from the last key of `chain`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedReport {
    pub report: Vec<u8>,
    pub signature: Vec<u8>,
    pub chain: Vec<ChainLink>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Ok,
    SignatureInvalid,
    GroupRevoked,
    SignatureRevoked,
    KeyRevoked,
    SigrlVersionMismatch,
    GroupOutOfDate,
    ConfigurationNeeded,
    SwHardeningNeeded,
    ConfigurationAndSwHardeningNeeded,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::GroupRevoked => "GROUP_REVOKED",
            Self::SignatureRevoked => "SIGNATURE_REVOKED",
            Self::KeyRevoked => "KEY_REVOKED",
            Self::SigrlVersionMismatch => "SIGRL_VERSION_MISMATCH",
            Self::GroupOutOfDate => "GROUP_OUT_OF_DATE",
            Self::ConfigurationNeeded => "CONFIGURATION_NEEDED",
            Self::SwHardeningNeeded => "SW_HARDENING_NEEDED",
            Self::ConfigurationAndSwHardeningNeeded => "CONFIGURATION_AND_SW_HARDENING_NEEDED",
        }
    }

    /// Statuses where the platform is genuine but behind on updates.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::GroupOutOfDate
                | Self::ConfigurationNeeded
                | Self::SwHardeningNeeded
                | Self::ConfigurationAndSwHardeningNeeded
        )
    }

    pub fn is_revoked(&self) -> bool {
        matches!(
            self,
            Self::GroupRevoked
                | Self::SignatureRevoked
                | Self::KeyRevoked
                | Self::SigrlVersionMismatch
        )
    }
}

impl Display for QuoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "OK" => Self::Ok,
            "SIGNATURE_INVALID" => Self::SignatureInvalid,
            "GROUP_REVOKED" => Self::GroupRevoked,
            "SIGNATURE_REVOKED" => Self::SignatureRevoked,
            "KEY_REVOKED" => Self::KeyRevoked,
            "SIGRL_VERSION_MISMATCH" => Self::SigrlVersionMismatch,
            "GROUP_OUT_OF_DATE" => Self::GroupOutOfDate,
            "CONFIGURATION_NEEDED" => Self::ConfigurationNeeded,
            "SW_HARDENING_NEEDED" => Self::SwHardeningNeeded,
            "CONFIGURATION_AND_SW_HARDENING_NEEDED" => Self::ConfigurationAndSwHardeningNeeded,
            other => return Err(other.to_string()),
        };
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_body_uses_service_field_names() {
        let json = r#"{
            "id": "1",
            "timestamp": "2024-01-01T00:00:00",
            "version": 4,
            "isvEnclaveQuoteStatus": "GROUP_OUT_OF_DATE",
            "advisoryIDs": ["INTEL-SA-00334"],
            "isvEnclaveQuoteBody": "0a0b"
        }"#;
        let body: ReportBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.isv_enclave_quote_body, vec![0x0a, 0x0b]);
        assert_eq!(body.advisory_ids, vec!["INTEL-SA-00334".to_string()]);
        assert_eq!(body.advisory_url, None);

        let status: QuoteStatus = body.isv_enclave_quote_status.parse().unwrap();
        assert!(status.is_stale());
        assert!(!status.is_revoked());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            QuoteStatus::Ok,
            QuoteStatus::KeyRevoked,
            QuoteStatus::ConfigurationAndSwHardeningNeeded,
        ] {
            assert_eq!(status.as_str().parse::<QuoteStatus>(), Ok(status));
        }
        assert_eq!(
            "SOMETHING_NEW".parse::<QuoteStatus>(),
            Err("SOMETHING_NEW".to_string())
        );
    }
}
