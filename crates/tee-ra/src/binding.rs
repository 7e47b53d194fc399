//! Binding application public keys to a verified quote.
//!
//! An enclave proves that a key was generated inside it by putting a digest of
//! the key's encoding into the quote's report data. [`PublicKeyAttester`]
//! recomputes that digest for a candidate key and, on a match, hands out an
//! [`AttestedKey`] which is the only way to obtain a key tied to a measurement.

use std::marker::PhantomData;

use k256::{ecdsa::VerifyingKey, elliptic_curve::sec1::ToEncodedPoint, PublicKey};
use log::debug;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::{
    error::SecurityError,
    quote::{Measurement, ReportData, REPORT_DATA_SIZE},
    verifier::VerifiedQuote,
};

/// Canonical byte encoding of a public key, as hashed into report data.
pub trait EncodedKey {
    fn encoded(&self) -> Vec<u8>;
}

impl EncodedKey for PublicKey {
    fn encoded(&self) -> Vec<u8> {
        self.to_encoded_point(true).as_bytes().to_vec()
    }
}

impl EncodedKey for VerifyingKey {
    fn encoded(&self) -> Vec<u8> {
        self.to_encoded_point(true).as_bytes().to_vec()
    }
}

impl<K: EncodedKey> EncodedKey for &K {
    fn encoded(&self) -> Vec<u8> {
        K::encoded(self)
    }
}

/// The public halves of an enclave's identity: a key for signing data and a
/// key for receiving encrypted mail. Bound as one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclaveKeys {
    pub data_signing_key: VerifyingKey,
    pub encryption_key: PublicKey,
}

impl EncodedKey for EnclaveKeys {
    fn encoded(&self) -> Vec<u8> {
        let mut out = self.data_signing_key.encoded();
        out.extend_from_slice(&self.encryption_key.encoded());
        out
    }
}

/// Anything that can be placed in a quote's report data field.
pub trait HasReportData {
    fn report_data(&self) -> ReportData;
}

impl HasReportData for ReportData {
    fn report_data(&self) -> ReportData {
        *self
    }
}

impl HasReportData for EnclaveKeys {
    fn report_data(&self) -> ReportData {
        report_data_for(self)
    }
}

/// The report data an enclave must attest to in order to vouch for `key`.
pub fn report_data_for(key: &impl EncodedKey) -> ReportData {
    let digest = Sha512::digest(key.encoded());
    let mut report_data = [0u8; REPORT_DATA_SIZE];
    report_data.copy_from_slice(&digest);
    report_data
}

/// A key that has been proven to come from the enclave with `measurement`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestedKey<K> {
    key: K,
    measurement: Measurement,
}

impl<K> AttestedKey<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn measurement(&self) -> Measurement {
        self.measurement
    }

    pub fn into_key(self) -> K {
        self.key
    }
}

pub struct PublicKeyAttester<'q, D = Sha512> {
    quote: &'q VerifiedQuote,
    _digest: PhantomData<D>,
}

impl<'q> PublicKeyAttester<'q> {
    pub fn new(quote: &'q VerifiedQuote) -> Result<Self, SecurityError> {
        Self::with_digest(quote)
    }
}

impl<'q, D: Digest> PublicKeyAttester<'q, D> {
    /// Uses `D` instead of SHA-512. The digest must fill the report data field
    /// exactly.
    pub fn with_digest(quote: &'q VerifiedQuote) -> Result<Self, SecurityError> {
        let digest = <D as Digest>::output_size();
        if digest != REPORT_DATA_SIZE {
            return Err(SecurityError::DigestLengthMismatch {
                digest,
                report_data: REPORT_DATA_SIZE,
            });
        }
        Ok(Self {
            quote,
            _digest: PhantomData,
        })
    }

    pub fn bind<K: EncodedKey>(&self, key: K) -> Result<AttestedKey<K>, SecurityError> {
        let digest = D::digest(key.encoded());
        if !bool::from(digest.as_slice().ct_eq(&self.quote.report_data)) {
            return Err(SecurityError::AttestationMismatch);
        }
        debug!("Key bound to enclave {}", self.quote.measurement);

        Ok(AttestedKey {
            key,
            measurement: self.quote.measurement,
        })
    }
}
