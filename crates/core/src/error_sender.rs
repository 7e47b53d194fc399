//! Enclave side of the error side channel, the counterpart of
//! [`ErrorHandler`](crate::ErrorHandler).

use std::sync::Arc;

use log::warn;

use crate::{
    context::ExecutionContext,
    error::HandlerFault,
    error_handler::{ERROR, NO_ERROR},
    handler::{DownstreamSlot, Handler, HandlerConnected, HasDownstream, PrefixSender, Sender},
    remote_error::RemoteError,
};

/// Frames everything the downstream sends with `NO_ERROR` and turns faults
/// raised below it into `ERROR` frames for the host.
pub struct ErrorSendingHandler {
    context: ExecutionContext,
}

impl ErrorSendingHandler {
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }
}

pub struct ErrorSendingConnection {
    upstream: Arc<dyn Sender>,
    context: ExecutionContext,
    downstream: DownstreamSlot,
}

impl ErrorSendingConnection {
    /// Reports `error` to the host. Messages are stripped first when running
    /// in a release enclave.
    pub fn send_error(&self, error: &RemoteError) -> Result<(), HandlerFault> {
        let encoded = if self.context.redacts_errors() {
            error.redacted().encode()
        } else {
            error.encode()
        }
        .map_err(HandlerFault::Encoding)?;

        self.upstream.send(1 + encoded.len(), &mut |buf| {
            buf.push(ERROR);
            buf.extend_from_slice(&encoded);
        });
        Ok(())
    }
}

impl HasDownstream for ErrorSendingConnection {
    fn set_downstream<H: Handler + 'static>(
        &self,
        handler: H,
    ) -> Result<Arc<HandlerConnected<H>>, HandlerFault> {
        let framed = Arc::new(PrefixSender::new(self.upstream.clone(), vec![NO_ERROR]));
        self.downstream.attach(handler, framed)
    }
}

impl Handler for ErrorSendingHandler {
    type Connection = ErrorSendingConnection;

    fn connect(&self, upstream: Arc<dyn Sender>) -> Self::Connection {
        ErrorSendingConnection {
            upstream,
            context: self.context,
            downstream: DownstreamSlot::default(),
        }
    }

    fn on_receive(&self, connection: &Self::Connection, input: &[u8]) -> Result<(), HandlerFault> {
        match connection.downstream.forward(input) {
            Ok(()) => Ok(()),
            Err(fault) => {
                warn!("Reporting handler fault to host: {fault}");
                connection.send_error(&RemoteError::from_error(&fault))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bastion_tee_ra::EnclaveMode;

    use super::*;
    use crate::testing::{FailingHandler, RecordingHandler, RecordingSender};

    fn connected(
        context: ExecutionContext,
    ) -> (HandlerConnected<ErrorSendingHandler>, Arc<RecordingSender>) {
        let upstream = RecordingSender::new();
        let chain = HandlerConnected::connect(ErrorSendingHandler::new(context), upstream.clone());
        (chain, upstream)
    }

    fn sent_error(frame: &[u8]) -> RemoteError {
        assert_eq!(frame[0], ERROR);
        RemoteError::decode(&frame[1..]).unwrap()
    }

    #[test]
    fn outbound_data_is_framed() {
        let (chain, upstream) = connected(ExecutionContext::Host);
        let downstream = chain
            .connection()
            .set_downstream(RecordingHandler::default())
            .unwrap();

        chain.handler().on_receive(chain.connection(), b"in").unwrap();
        downstream.connection().send(b"out");

        assert_eq!(downstream.handler().received(), vec![b"in".to_vec()]);
        assert_eq!(upstream.sent(), vec![b"\x00out".to_vec()]);
    }

    #[test]
    fn downstream_faults_are_reported() {
        let (chain, upstream) = connected(ExecutionContext::Enclave {
            mode: EnclaveMode::Debug,
        });
        chain
            .connection()
            .set_downstream(FailingHandler(HandlerFault::UnknownChannel(9)))
            .unwrap();

        chain.handler().on_receive(chain.connection(), b"x").unwrap();

        let sent = upstream.sent();
        assert_eq!(sent.len(), 1);
        let error = sent_error(&sent[0]);
        assert_eq!(error.kind, "HandlerFault");
        assert_eq!(error.message.as_deref(), Some("no channel with id 9"));
    }

    #[test]
    fn release_enclave_redacts_messages() {
        let (chain, upstream) = connected(ExecutionContext::Enclave {
            mode: EnclaveMode::Release,
        });
        let error = RemoteError::new("KeyError", Some("secret 1234".to_string()))
            .with_cause(RemoteError::new("Io", Some("disk /dev/sgx".to_string())));

        chain.connection().send_error(&error).unwrap();

        let sent = sent_error(&upstream.sent()[0]);
        assert_eq!(sent, error.redacted());
        assert!(sent.chain().all(|e| e.message.is_none()));
    }

    #[test]
    fn host_and_debug_keep_messages() {
        let error = RemoteError::new("KeyError", Some("details".to_string()));
        for context in [
            ExecutionContext::Host,
            ExecutionContext::Enclave {
                mode: EnclaveMode::Debug,
            },
        ] {
            let (chain, upstream) = connected(context);
            chain.connection().send_error(&error).unwrap();
            assert_eq!(sent_error(&upstream.sent()[0]), error);
        }
    }
}
