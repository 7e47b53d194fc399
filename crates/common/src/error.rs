use bastion_tee_ra::{AttestationDecodeError, SecurityError, VerificationError};
use bastion_wire::WireError;
use displaydoc::Display;
use thiserror::Error;

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum EiiError {
    /// bytes are not an enclave instance info
    NotRecognized,
    /// enclave instance info is truncated: {0}
    Truncated(WireError),
    /// enclave instance info is corrupted: {0}
    Corrupted(#[source] CorruptionCause),
    /// attestation rejected: {0}
    Verification(#[from] VerificationError),
    /// enclave keys are not bound to the attestation: {0}
    Binding(#[from] SecurityError),
    /// enclave instance info cannot be encoded: {0}
    Encoding(WireError),
    /// data signature does not verify against the enclave's signing key
    InvalidSignature,
    /// attestor failed: {0}
    Attestor(String),
    /// invalid enclave identity key material: {0}
    InvalidIdentity(String),
}

/// Why a serialized enclave instance info could not be decoded.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum CorruptionCause {
    /// {0}
    Wire(#[source] WireError),
    /// {0}
    Attestation(#[source] AttestationDecodeError),
    /// invalid {field}
    Key {
        field: &'static str,
        #[source]
        source: k256::elliptic_curve::Error,
    },
    /// {0}
    Quote(#[source] VerificationError),
}

impl From<WireError> for EiiError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Truncated { .. } => Self::Truncated(e),
            other => Self::Corrupted(CorruptionCause::Wire(other)),
        }
    }
}

impl From<AttestationDecodeError> for EiiError {
    fn from(e: AttestationDecodeError) -> Self {
        match e {
            AttestationDecodeError::Wire(e) => e.into(),
            other => Self::Corrupted(CorruptionCause::Attestation(other)),
        }
    }
}
