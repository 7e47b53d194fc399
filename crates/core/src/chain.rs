//! Explicit composition of handler chains at startup.
//!
//! ```ignore
//! let chain = ChainBuilder::new(transport, ErrorHandler::new(on_error))
//!     .then(MuxingHandler)?
//!     .build();
//! let (_, attestation) = chain.tip().connection().add_channel(handler);
//! ```

use std::sync::Arc;

use crate::{
    error::HandlerFault,
    handler::{Downstream, Handler, HandlerConnected, HasDownstream, Sender},
};

/// A partly built chain whose last stage is `H`. Stages can only be added
/// below connections that take a downstream, which the compiler checks.
pub struct ChainBuilder<H: Handler> {
    root: Arc<dyn Downstream>,
    tip: Arc<HandlerConnected<H>>,
}

impl<H: Handler + 'static> ChainBuilder<H> {
    /// Starts a chain with `root` connected directly to `transport`.
    pub fn new(transport: Arc<dyn Sender>, root: H) -> Self {
        let tip = Arc::new(HandlerConnected::connect(root, transport));
        let root: Arc<dyn Downstream> = tip.clone();
        Self { root, tip }
    }

    pub fn then<N: Handler + 'static>(self, next: N) -> Result<ChainBuilder<N>, HandlerFault>
    where
        H::Connection: HasDownstream,
    {
        let tip = self.tip.connection().set_downstream(next)?;
        Ok(ChainBuilder {
            root: self.root,
            tip,
        })
    }

    pub fn build(self) -> Chain<H> {
        Chain {
            root: self.root,
            tip: self.tip,
        }
    }
}

/// A fully wired chain. Inbound buffers from the transport go to
/// [`Chain::on_receive`].
pub struct Chain<H: Handler> {
    root: Arc<dyn Downstream>,
    tip: Arc<HandlerConnected<H>>,
}

impl<H: Handler> Chain<H> {
    pub fn on_receive(&self, input: &[u8]) -> Result<(), HandlerFault> {
        self.root.on_receive(input)
    }

    pub fn root(&self) -> Arc<dyn Downstream> {
        self.root.clone()
    }

    /// The last stage, for attaching channels or talking to the peer.
    pub fn tip(&self) -> &Arc<HandlerConnected<H>> {
        &self.tip
    }
}

#[cfg(test)]
mod tests {
    use bastion_common::EnclaveIdentity;
    use bastion_tee_ra::{mock::MockAttestor, AttestationVerifier, EnclaveMode, Measurement};
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        attestation::{AttestationEnclaveHandler, AttestationHostHandler},
        context::ExecutionContext,
        error_handler::ErrorHandler,
        error_sender::ErrorSendingHandler,
        muxing::MuxingHandler,
        remote_error::RemoteError,
        testing::{FailingHandler, Loopback, RecordingHandler, RecordingSender},
    };

    #[test]
    fn stages_are_connected_in_order() {
        let transport = RecordingSender::new();
        let chain = ChainBuilder::new(transport.clone(), ErrorHandler::new(|_| {}))
            .then(RecordingHandler::default())
            .unwrap()
            .build();

        chain.on_receive(b"\x00hello").unwrap();
        chain.tip().connection().send(b"reply");

        assert_eq!(chain.tip().handler().received(), vec![b"hello".to_vec()]);
        assert_eq!(transport.sent(), vec![b"reply".to_vec()]);
    }

    #[test]
    fn host_and_enclave_over_loopback() {
        let verifier = AttestationVerifier::new(None, true);
        let identity = EnclaveIdentity::generate();
        let keys = identity.public_keys();
        let errors = Arc::new(Mutex::new(Vec::<RemoteError>::new()));

        let to_enclave = Loopback::new();
        let to_host = Loopback::new();

        let sink = errors.clone();
        let host = ChainBuilder::new(
            to_enclave.clone(),
            ErrorHandler::new(move |e| sink.lock().push(e)),
        )
        .then(MuxingHandler)
        .unwrap()
        .build();
        let enclave = ChainBuilder::new(
            to_host.clone(),
            ErrorSendingHandler::new(ExecutionContext::Enclave {
                mode: EnclaveMode::Debug,
            }),
        )
        .then(MuxingHandler)
        .unwrap()
        .build();
        to_enclave.connect_to(enclave.root());
        to_host.connect_to(host.root());

        // channels are numbered in the order they are added on each side
        let (_, attestation) = host
            .tip()
            .connection()
            .add_channel(AttestationHostHandler::new(verifier.clone()));
        let (_, echo) = host.tip().connection().add_channel(RecordingHandler::default());
        enclave.tip().connection().add_channel(AttestationEnclaveHandler::new(
            identity,
            MockAttestor::new(Measurement([1; 32])),
            verifier,
        ));
        enclave
            .tip()
            .connection()
            .add_channel(FailingHandler(HandlerFault::DownstreamNotSet));

        attestation.connection().request();
        let eii = attestation.connection().instance_info().unwrap();
        assert_eq!(eii.keys(), &keys);
        assert!(errors.lock().is_empty());

        echo.connection().send(b"anything");
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, "HandlerFault");
        assert!(echo.handler().received().is_empty());
    }
}
