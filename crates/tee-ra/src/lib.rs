#![doc = include_str!("../README.md")]
#![warn(
    clippy::checked_conversions,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    rust_2018_idioms,
    unused_lifetimes
)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    warnings
)]
#![forbid(unsafe_code)]

pub mod attestation;
pub mod attestor;
pub mod binding;
pub mod error;
#[cfg(any(test, feature = "mock-sgx"))]
pub mod mock;
pub mod quote;
pub mod report;
pub mod verifier;

pub use attestation::Attestation;
pub use attestor::Attestor;
pub use binding::{
    report_data_for, AttestedKey, EncodedKey, EnclaveKeys, HasReportData, PublicKeyAttester,
};
pub use error::{AttestationDecodeError, SecurityError, VerificationError};
pub use quote::{EnclaveInfo, EnclaveMode, Measurement, QuoteBody, ReportData};
pub use report::QuoteStatus;
pub use verifier::{
    AttestationVerifier, SecurityInfo, SecuritySummary, VerifiedQuote, VerifierConfig,
};
