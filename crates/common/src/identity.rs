use bastion_mail::{EnclaveMail, EncryptedMail, MailError, PostOffice};
use bastion_tee_ra::{AttestationVerifier, Attestor, EnclaveKeys};
use k256::{
    ecdsa::{signature::Signer, Signature, SigningKey},
    PublicKey, SecretKey,
};
use log::{debug, info};
use rand::rngs::OsRng;

use crate::{error::EiiError, instance_info::EnclaveInstanceInfo};

const SCALAR_SIZE: usize = 32;

/// The private half of an enclave instance: a secp256k1 key for signing data
/// and a secp256k1 key for receiving mail.
#[derive(Clone)]
pub struct EnclaveIdentity {
    signing_key: SigningKey,
    encryption_key: SecretKey,
}

impl EnclaveIdentity {
    pub fn generate() -> Self {
        info!("Creating new enclave identity with random keys");
        Self {
            signing_key: SigningKey::random(&mut OsRng),
            encryption_key: SecretKey::random(&mut OsRng),
        }
    }

    /// Restores an identity exported with [`EnclaveIdentity::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EiiError> {
        if bytes.len() != 2 * SCALAR_SIZE {
            return Err(EiiError::InvalidIdentity(format!(
                "expected {} bytes, got {}",
                2 * SCALAR_SIZE,
                bytes.len()
            )));
        }
        let (signing, encryption) = bytes.split_at(SCALAR_SIZE);
        let signing_key = SigningKey::from_slice(signing)
            .map_err(|e| EiiError::InvalidIdentity(format!("signing key: {e}")))?;
        let encryption_key = SecretKey::from_slice(encryption)
            .map_err(|e| EiiError::InvalidIdentity(format!("encryption key: {e}")))?;
        Ok(Self {
            signing_key,
            encryption_key,
        })
    }

    /// Both private scalars, signing key first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.signing_key.to_bytes().to_vec();
        out.extend_from_slice(&self.encryption_key.to_bytes());
        out
    }

    pub fn public_keys(&self) -> EnclaveKeys {
        EnclaveKeys {
            data_signing_key: *self.signing_key.verifying_key(),
            encryption_key: self.encryption_key.public_key(),
        }
    }

    pub fn encryption_key(&self) -> &SecretKey {
        &self.encryption_key
    }

    /// Asks `attestor` to attest to this identity's public keys and wraps the
    /// result. The attestation is checked with `verifier` just as a client
    /// would check it.
    pub fn instance_info<A: Attestor>(
        &self,
        attestor: &A,
        verifier: &AttestationVerifier,
    ) -> Result<EnclaveInstanceInfo, EiiError> {
        let keys = self.public_keys();
        let attestation = attestor
            .attestation(keys.clone())
            .map_err(|e| EiiError::Attestor(e.to_string()))?;
        debug!("Obtained {} attestation", attestation.kind());
        EnclaveInstanceInfo::new(keys, attestation, verifier)
    }

    /// DER-encoded ECDSA signature, checked with
    /// [`EnclaveInstanceInfo::verify_signature`].
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_der().as_bytes().to_vec()
    }

    pub fn decrypt_mail(&self, mail: &EncryptedMail) -> Result<EnclaveMail, MailError> {
        mail.decrypt(&self.encryption_key)
    }

    /// A post office for replies, authenticated with the encryption key.
    pub fn post_office(
        &self,
        recipient: PublicKey,
        topic: impl Into<String>,
    ) -> Result<PostOffice, MailError> {
        PostOffice::new(recipient, self.encryption_key.clone(), topic)
    }
}

#[cfg(test)]
mod tests {
    use bastion_mail::MutableMail;

    use super::*;

    #[test]
    fn export_import_keeps_keys() {
        let identity = EnclaveIdentity::generate();
        let restored = EnclaveIdentity::from_bytes(&identity.to_bytes()).unwrap();
        assert_eq!(restored.public_keys(), identity.public_keys());
    }

    #[test]
    fn bad_key_material_is_rejected() {
        assert!(matches!(
            EnclaveIdentity::from_bytes(&[1u8; 10]),
            Err(EiiError::InvalidIdentity(_))
        ));
        assert!(matches!(
            EnclaveIdentity::from_bytes(&[0u8; 64]),
            Err(EiiError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn replies_are_authenticated_by_the_enclave() {
        let identity = EnclaveIdentity::generate();
        let client = SecretKey::random(&mut OsRng);

        let reply = identity
            .post_office(client.public_key(), "replies")
            .unwrap()
            .encrypt_mail(b"done")
            .unwrap();
        let received = reply.decrypt(&client).unwrap();
        assert_eq!(
            received.authenticated_sender(),
            Some(&identity.public_keys().encryption_key)
        );

        let request = MutableMail::new(b"go".to_vec(), identity.public_keys().encryption_key, None)
            .encrypt()
            .unwrap();
        assert_eq!(identity.decrypt_mail(&request).unwrap().body(), b"go");
    }
}
