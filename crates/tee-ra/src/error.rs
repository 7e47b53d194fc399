use bastion_wire::WireError;
use displaydoc::Display;
use thiserror::Error;

use crate::report::QuoteStatus;

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// malformed quote: {0}
    MalformedQuote(String),
    /// attestation report signature chain does not validate
    UntrustedSignature,
    /// platform has been revoked (quote status {0})
    Revoked(QuoteStatus),
    /// unrecognised quote status `{0}`
    UnknownQuoteStatus(String),
    /// mock attestations are not accepted by this verifier
    MockNotAllowed,
    /// invalid trusted root key: {0}
    InvalidTrustedRoot(String),
}

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum SecurityError {
    /// public key digest does not match the attested report data
    AttestationMismatch,
    /// digest output of {digest} bytes does not fit the {report_data}-byte report data field
    DigestLengthMismatch { digest: usize, report_data: usize },
}

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum AttestationDecodeError {
    /// {0}
    Wire(#[from] WireError),
    /// unknown attestation kind {0:#04x}
    UnknownKind(u8),
}
