//! Attestors and a report issuer for running without SGX hardware.
//!
//! [`MockAttestor`] produces unsigned [`Attestation::Mock`] blobs, which a
//! verifier only accepts with `allow_mock`. [`ReportIssuer`] plays the part of
//! the attestation service: it owns a P-256 root and signing chain and issues
//! signed reports with any quote status, so the full verification path can be
//! exercised. (only meant for testing and local development)

use std::time::{SystemTime, UNIX_EPOCH};

use p256::ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::{
    attestation::Attestation,
    attestor::Attestor,
    binding::HasReportData,
    quote::{Measurement, MrSigner, QuoteBody, ReportData},
    report::{ChainLink, QuoteStatus, ReportBody, SignedReport},
    verifier::AttestationVerifier,
};

const REPORT_VERSION: u64 = 4;

/// A mock `Attestor` whose quotes carry a fixed measurement and no signature.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MockAttestor {
    measurement: Measurement,
}

impl MockAttestor {
    pub fn new(measurement: Measurement) -> Self {
        Self { measurement }
    }

    pub fn mock_attestation(&self, report_data: ReportData) -> Attestation {
        Attestation::Mock {
            quote_body: self.quote_body(report_data).as_bytes().to_vec(),
        }
    }

    fn quote_body(&self, report_data: ReportData) -> QuoteBody {
        QuoteBody::new(self.measurement, MrSigner::default(), 0, 1, false, report_data)
    }
}

impl Attestor for MockAttestor {
    type Error = String;

    fn quote(&self, report_data: impl HasReportData) -> Result<Vec<u8>, Self::Error> {
        Ok(self.quote_body(report_data.report_data()).as_bytes().to_vec())
    }

    fn measurement(&self) -> Result<Measurement, Self::Error> {
        Ok(self.measurement)
    }

    fn attestation(&self, report_data: impl HasReportData) -> Result<Attestation, Self::Error> {
        Ok(self.mock_attestation(report_data.report_data()))
    }
}

/// A stand-in attestation service with its own root of trust.
pub struct ReportIssuer {
    root: SigningKey,
    chain: Vec<ChainLink>,
    leaf: SigningKey,
}

impl ReportIssuer {
    /// Generates a fresh root and a chain of `links` certified keys below it.
    /// With zero links the root signs reports itself.
    pub fn generate(links: usize) -> Self {
        let root = SigningKey::random(&mut OsRng);
        let mut chain = Vec::with_capacity(links);
        let mut issuer = root.clone();
        for _ in 0..links {
            let subject = SigningKey::random(&mut OsRng);
            let public_key = sec1(subject.verifying_key());
            let signature: Signature = issuer.sign(&public_key);
            chain.push(ChainLink {
                public_key,
                signature: signature.to_der().as_bytes().to_vec(),
            });
            issuer = subject;
        }
        Self {
            root,
            chain,
            leaf: issuer,
        }
    }

    pub fn root_key(&self) -> VerifyingKey {
        *self.root.verifying_key()
    }

    /// The root key as configured in `VerifierConfig::trusted_root`.
    pub fn root_key_hex(&self) -> String {
        hex::encode(sec1(self.root.verifying_key()))
    }

    pub fn verifier(&self) -> AttestationVerifier {
        AttestationVerifier::new(Some(self.root_key()), false)
    }

    pub fn issue(
        &self,
        quote: &QuoteBody,
        status: QuoteStatus,
        advisory_ids: Vec<String>,
    ) -> Result<Attestation, serde_json::Error> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let body = ReportBody {
            id: format!("{timestamp}-{}", hex::encode(&quote.report_data()[..8])),
            timestamp: timestamp.to_string(),
            version: REPORT_VERSION,
            isv_enclave_quote_status: status.to_string(),
            advisory_ids,
            advisory_url: None,
            isv_enclave_quote_body: quote.as_bytes().to_vec(),
        };
        let report = serde_json::to_vec(&body)?;
        let signature: Signature = self.leaf.sign(&report);

        Ok(Attestation::Signed(SignedReport {
            report,
            signature: signature.to_der().as_bytes().to_vec(),
            chain: self.chain.clone(),
        }))
    }
}

/// An `Attestor` backed by a [`ReportIssuer`], producing signed reports that
/// pass full verification against the issuer's root.
pub struct SimulatedAttestor {
    issuer: ReportIssuer,
    measurement: Measurement,
    debug: bool,
}

impl SimulatedAttestor {
    pub fn new(issuer: ReportIssuer, measurement: Measurement) -> Self {
        Self {
            issuer,
            measurement,
            debug: false,
        }
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn issuer(&self) -> &ReportIssuer {
        &self.issuer
    }

    fn quote_body(&self, report_data: ReportData) -> QuoteBody {
        QuoteBody::new(
            self.measurement,
            MrSigner::default(),
            0,
            1,
            self.debug,
            report_data,
        )
    }
}

impl Attestor for SimulatedAttestor {
    type Error = String;

    fn quote(&self, report_data: impl HasReportData) -> Result<Vec<u8>, Self::Error> {
        Ok(self.quote_body(report_data.report_data()).as_bytes().to_vec())
    }

    fn measurement(&self) -> Result<Measurement, Self::Error> {
        Ok(self.measurement)
    }

    fn attestation(&self, report_data: impl HasReportData) -> Result<Attestation, Self::Error> {
        let quote = self.quote_body(report_data.report_data());
        self.issuer
            .issue(&quote, QuoteStatus::Ok, vec![])
            .map_err(|e| e.to_string())
    }
}

fn sec1(key: &VerifyingKey) -> Vec<u8> {
    key.to_encoded_point(true).as_bytes().to_vec()
}
