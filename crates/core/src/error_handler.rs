//! Host side of the error side channel.
//!
//! Every message from the enclave starts with a discriminator byte:
//! [`NO_ERROR`] followed by data for the downstream handler, or [`ERROR`]
//! followed by an encoded [`RemoteError`].

use std::sync::Arc;

use bastion_wire::Cursor;
use log::{debug, warn};

use crate::{
    error::HandlerFault,
    handler::{DownstreamSlot, Handler, HandlerConnected, HasDownstream, Sender},
    remote_error::RemoteError,
};

pub const NO_ERROR: u8 = 0;
pub const ERROR: u8 = 1;

/// Splits enclave errors from regular traffic. Errors go to `on_error` and
/// are never forwarded.
pub struct ErrorHandler<F> {
    on_error: F,
}

impl<F> ErrorHandler<F>
where
    F: Fn(RemoteError) + Send + Sync,
{
    pub fn new(on_error: F) -> Self {
        Self { on_error }
    }
}

pub struct ErrorConnection {
    upstream: Arc<dyn Sender>,
    downstream: DownstreamSlot,
}

impl HasDownstream for ErrorConnection {
    /// Outbound data from the downstream is passed to the upstream unframed.
    fn set_downstream<H: Handler + 'static>(
        &self,
        handler: H,
    ) -> Result<Arc<HandlerConnected<H>>, HandlerFault> {
        self.downstream.attach(handler, self.upstream.clone())
    }
}

impl<F> Handler for ErrorHandler<F>
where
    F: Fn(RemoteError) + Send + Sync,
{
    type Connection = ErrorConnection;

    fn connect(&self, upstream: Arc<dyn Sender>) -> Self::Connection {
        ErrorConnection {
            upstream,
            downstream: DownstreamSlot::default(),
        }
    }

    fn on_receive(&self, connection: &Self::Connection, input: &[u8]) -> Result<(), HandlerFault> {
        let mut cursor = Cursor::new(input);
        let discriminator = cursor.get_u8().map_err(HandlerFault::Truncated)?;

        match discriminator {
            NO_ERROR => connection.downstream.forward(cursor.rest()),
            ERROR => {
                let payload = cursor.rest();
                let error = RemoteError::decode(payload).unwrap_or_else(|e| {
                    warn!("Malformed error payload from enclave: {e}");
                    RemoteError::diagnostic(payload, &e)
                });
                debug!("Received enclave error: {error}");
                (self.on_error)(error);
                Ok(())
            }
            other => Err(HandlerFault::UnrecognizedDiscriminator(other)),
        }
    }
}
