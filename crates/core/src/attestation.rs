//! The attestation exchange. The host asks, and the enclave replies with its
//! serialized [`EnclaveInstanceInfo`].

use std::sync::{Arc, OnceLock};

use bastion_common::{EnclaveIdentity, EnclaveInstanceInfo};
use bastion_tee_ra::{AttestationVerifier, Attestor};
use log::{debug, info};

use crate::{
    error::HandlerFault,
    handler::{Handler, Sender},
};

/// Enclave side. Every inbound message, whatever its content, is answered
/// with a fresh attestation of `identity`.
pub struct AttestationEnclaveHandler<A> {
    identity: EnclaveIdentity,
    attestor: A,
    verifier: AttestationVerifier,
}

impl<A: Attestor> AttestationEnclaveHandler<A> {
    /// `verifier` checks each attestation before it is sent, the same way the
    /// host will.
    pub fn new(identity: EnclaveIdentity, attestor: A, verifier: AttestationVerifier) -> Self {
        Self {
            identity,
            attestor,
            verifier,
        }
    }

    pub fn identity(&self) -> &EnclaveIdentity {
        &self.identity
    }
}

pub struct ReplyConnection {
    upstream: Arc<dyn Sender>,
}

impl<A: Attestor> Handler for AttestationEnclaveHandler<A> {
    type Connection = ReplyConnection;

    fn connect(&self, upstream: Arc<dyn Sender>) -> Self::Connection {
        ReplyConnection { upstream }
    }

    fn on_receive(&self, connection: &Self::Connection, _input: &[u8]) -> Result<(), HandlerFault> {
        let eii = self
            .identity
            .instance_info(&self.attestor, &self.verifier)
            .map_err(|e| HandlerFault::Attestation(e.to_string()))?;
        let bytes = eii.serialize();
        info!("Sending attestation for enclave {}", eii.measurement());

        connection
            .upstream
            .send(bytes.len(), &mut |buf| buf.extend_from_slice(&bytes));
        Ok(())
    }
}

/// Host side. Verifies the enclave's reply and keeps the first
/// [`EnclaveInstanceInfo`] received.
pub struct AttestationHostHandler {
    verifier: AttestationVerifier,
}

impl AttestationHostHandler {
    pub fn new(verifier: AttestationVerifier) -> Self {
        Self { verifier }
    }
}

pub struct AttestationHostConnection {
    upstream: Arc<dyn Sender>,
    instance_info: OnceLock<EnclaveInstanceInfo>,
}

impl AttestationHostConnection {
    /// Asks the enclave for its attestation.
    pub fn request(&self) {
        self.upstream.send(0, &mut |_| {});
    }

    pub fn instance_info(&self) -> Option<&EnclaveInstanceInfo> {
        self.instance_info.get()
    }
}

impl Handler for AttestationHostHandler {
    type Connection = AttestationHostConnection;

    fn connect(&self, upstream: Arc<dyn Sender>) -> Self::Connection {
        AttestationHostConnection {
            upstream,
            instance_info: OnceLock::new(),
        }
    }

    fn on_receive(&self, connection: &Self::Connection, input: &[u8]) -> Result<(), HandlerFault> {
        let eii = EnclaveInstanceInfo::deserialize(input, &self.verifier)
            .map_err(|e| HandlerFault::Attestation(e.to_string()))?;
        info!(
            "Enclave {} attested ({:?})",
            eii.measurement(),
            eii.security_info().summary
        );
        if connection.instance_info.set(eii).is_err() {
            debug!("Keeping the first attestation received");
        }
        Ok(())
    }
}
