use std::fmt::{Display, Formatter};

use bastion_mail::{MailError, PostOffice, DEFAULT_TOPIC};
use bastion_tee_ra::{
    Attestation, AttestationVerifier, EncodedKey, EnclaveInfo, EnclaveKeys, Measurement,
    PublicKeyAttester, SecurityInfo, VerificationError, VerifiedQuote,
};
use bastion_wire::{Cursor, WireWrite};
use k256::{
    ecdsa::{signature::Verifier, Signature, VerifyingKey},
    PublicKey, SecretKey,
};
use log::debug;
use rand::rngs::OsRng;
use serde::Serialize;

use crate::error::{CorruptionCause, EiiError};

const MAGIC: &[u8; 3] = b"EII";

fn corrupted_key(field: &'static str, source: k256::elliptic_curve::Error) -> EiiError {
    EiiError::Corrupted(CorruptionCause::Key { field, source })
}

/// A verified description of a running enclave instance.
///
/// Values of this type only exist once the attestation has been verified and
/// both public keys have been shown to be bound to its report data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclaveInstanceInfo {
    keys: EnclaveKeys,
    attestation: Attestation,
    attestation_bytes: Vec<u8>,
    verified: VerifiedQuote,
}

impl EnclaveInstanceInfo {
    /// Verifies `attestation` and checks that its report data commits to `keys`.
    pub fn new(
        keys: EnclaveKeys,
        attestation: Attestation,
        verifier: &AttestationVerifier,
    ) -> Result<Self, EiiError> {
        let attestation_bytes = attestation.to_bytes().map_err(EiiError::Encoding)?;
        Self::verified(keys, attestation, attestation_bytes, verifier)
    }

    fn verified(
        keys: EnclaveKeys,
        attestation: Attestation,
        attestation_bytes: Vec<u8>,
        verifier: &AttestationVerifier,
    ) -> Result<Self, EiiError> {
        let verified = verifier.verify(&attestation)?;
        let keys = PublicKeyAttester::new(&verified)?.bind(keys)?.into_key();
        debug!(
            "Enclave instance {} verified ({:?})",
            verified.measurement, verified.security_info.summary
        );

        Ok(Self {
            keys,
            attestation,
            attestation_bytes,
            verified,
        })
    }

    pub fn deserialize(bytes: &[u8], verifier: &AttestationVerifier) -> Result<Self, EiiError> {
        if bytes.len() <= MAGIC.len() || !bytes.starts_with(MAGIC) {
            return Err(EiiError::NotRecognized);
        }
        let mut cursor = Cursor::new(&bytes[MAGIC.len()..]);

        let data_signing_key = PublicKey::from_sec1_bytes(cursor.get_u32_prefixed()?)
            .map(VerifyingKey::from)
            .map_err(|e| corrupted_key("data signing key", e))?;
        let encryption_key = PublicKey::from_sec1_bytes(cursor.get_u32_prefixed()?)
            .map_err(|e| corrupted_key("encryption key", e))?;

        let start = cursor.position();
        let attestation = Attestation::read_from(&mut cursor)?;
        let attestation_bytes = cursor.consumed()[start..].to_vec();
        if cursor.has_remaining() {
            debug!(
                "Ignoring {} trailing bytes after enclave instance info",
                cursor.remaining()
            );
        }

        // a quote that does not parse is a decoding failure, not a trust decision
        Self::verified(
            EnclaveKeys {
                data_signing_key,
                encryption_key,
            },
            attestation,
            attestation_bytes,
            verifier,
        )
        .map_err(|e| match e {
            EiiError::Verification(e @ VerificationError::MalformedQuote(_)) => {
                EiiError::Corrupted(CorruptionCause::Quote(e))
            }
            e => e,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let signing = self.keys.data_signing_key.encoded();
        let encryption = self.keys.encryption_key.encoded();

        let mut buf = Vec::with_capacity(
            MAGIC.len() + 8 + signing.len() + encryption.len() + self.attestation_bytes.len(),
        );
        buf.put_slice(MAGIC);
        // compressed points are 33 bytes, so neither length can overflow a u32
        buf.put_u32(signing.len() as u32);
        buf.put_slice(&signing);
        buf.put_u32(encryption.len() as u32);
        buf.put_slice(&encryption);
        buf.put_slice(&self.attestation_bytes);
        buf
    }

    pub fn data_signing_key(&self) -> &VerifyingKey {
        &self.keys.data_signing_key
    }

    pub fn encryption_key(&self) -> &PublicKey {
        &self.keys.encryption_key
    }

    pub fn keys(&self) -> &EnclaveKeys {
        &self.keys
    }

    pub fn attestation(&self) -> &Attestation {
        &self.attestation
    }

    pub fn measurement(&self) -> Measurement {
        self.verified.measurement
    }

    pub fn enclave_info(&self) -> &EnclaveInfo {
        &self.verified.enclave_info
    }

    pub fn security_info(&self) -> &SecurityInfo {
        &self.verified.security_info
    }

    /// Checks a DER-encoded ECDSA signature made with the enclave's data
    /// signing key.
    pub fn verify_signature(&self, message: &[u8], signature: &[u8]) -> Result<(), EiiError> {
        let signature = Signature::from_der(signature).map_err(|_| EiiError::InvalidSignature)?;
        self.keys
            .data_signing_key
            .verify(message, &signature)
            .map_err(|_| EiiError::InvalidSignature)
    }

    /// A post office for mail to this enclave. Use one per (topic, sender key).
    pub fn create_post_office(
        &self,
        sender_key: SecretKey,
        topic: impl Into<String>,
    ) -> Result<PostOffice, MailError> {
        PostOffice::new(self.keys.encryption_key, sender_key, topic)
    }

    /// A post office on the default topic with a fresh random sender key.
    pub fn create_post_office_default(&self) -> Result<PostOffice, MailError> {
        self.create_post_office(SecretKey::random(&mut OsRng), DEFAULT_TOPIC)
    }

    pub fn summary(&self) -> InstanceSummary {
        InstanceSummary {
            measurement: self.measurement(),
            enclave_info: self.enclave_info().clone(),
            security_info: self.security_info().clone(),
            attestation: self.attestation.kind(),
            data_signing_key: hex::encode(self.keys.data_signing_key.encoded()),
            encryption_key: hex::encode(self.keys.encryption_key.encoded()),
        }
    }
}

impl Display for EnclaveInstanceInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let info = self.enclave_info();
        let security = self.security_info();
        writeln!(f, "Remote attestation for enclave {}:", self.measurement())?;
        writeln!(f, "  Mode: {:?}", info.enclave_mode)?;
        writeln!(
            f,
            "  Code signing key hash: {}",
            hex::encode(info.code_signing_key_hash)
        )?;
        writeln!(
            f,
            "  Product ID: {}, revocation level: {}",
            info.product_id, info.revocation_level
        )?;
        writeln!(f, "  Assessed security level: {:?}", security.summary)?;
        writeln!(f, "    {}", security.reason)?;
        for advisory in &security.advisory_ids {
            writeln!(f, "    advisory: {advisory}")?;
        }
        writeln!(
            f,
            "  Data signing key: {}",
            hex::encode(self.keys.data_signing_key.encoded())
        )?;
        write!(
            f,
            "  Encryption key: {}",
            hex::encode(self.keys.encryption_key.encoded())
        )
    }
}

/// A serializable view of an [`EnclaveInstanceInfo`] for display and tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub measurement: Measurement,
    pub enclave_info: EnclaveInfo,
    pub security_info: SecurityInfo,
    pub attestation: &'static str,
    pub data_signing_key: String,
    pub encryption_key: String,
}
