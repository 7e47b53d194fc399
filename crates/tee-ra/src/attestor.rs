use crate::{attestation::Attestation, binding::HasReportData, quote::Measurement};

/// The trait defines the interface for producing attestations from within an enclave.
pub trait Attestor: Send + Sync + 'static {
    type Error: ToString;

    /// A raw quote committing to `report_data`.
    fn quote(&self, report_data: impl HasReportData) -> Result<Vec<u8>, Self::Error>;

    fn measurement(&self) -> Result<Measurement, Self::Error>;

    /// A quote wrapped into an attestation that a remote verifier can check.
    fn attestation(&self, report_data: impl HasReportData) -> Result<Attestation, Self::Error>;
}
