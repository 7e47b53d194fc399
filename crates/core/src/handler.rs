//! The traits every stage of a chain implements.

use std::sync::{Arc, OnceLock};

use crate::error::HandlerFault;

/// Outbound half of a connection, provided by the transport or by the stage
/// above.
pub trait Sender: Send + Sync {
    /// Sends one message of exactly `len` bytes. `writer` appends those bytes
    /// to the buffer it is given.
    fn send(&self, len: usize, writer: &mut dyn FnMut(&mut Vec<u8>));
}

/// A stage of a chain. Connecting it to an upstream [`Sender`] yields a
/// connection, and every inbound buffer for that connection is passed to
/// [`Handler::on_receive`] along with it.
pub trait Handler: Send + Sync {
    type Connection: Send + Sync;

    fn connect(&self, upstream: Arc<dyn Sender>) -> Self::Connection;

    fn on_receive(&self, connection: &Self::Connection, input: &[u8]) -> Result<(), HandlerFault>;
}

/// A handler together with its connection, with the types erased.
pub trait Downstream: Send + Sync {
    fn on_receive(&self, input: &[u8]) -> Result<(), HandlerFault>;
}

pub struct HandlerConnected<H: Handler> {
    handler: H,
    connection: H::Connection,
}

impl<H: Handler> HandlerConnected<H> {
    pub fn connect(handler: H, upstream: Arc<dyn Sender>) -> Self {
        let connection = handler.connect(upstream);
        Self {
            handler,
            connection,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn connection(&self) -> &H::Connection {
        &self.connection
    }
}

impl<H: Handler> Downstream for HandlerConnected<H> {
    fn on_receive(&self, input: &[u8]) -> Result<(), HandlerFault> {
        self.handler.on_receive(&self.connection, input)
    }
}

/// Connections that pass data on to exactly one downstream handler.
pub trait HasDownstream {
    /// Connects `handler` below this connection. Only one downstream can
    /// ever be set.
    fn set_downstream<H: Handler + 'static>(
        &self,
        handler: H,
    ) -> Result<Arc<HandlerConnected<H>>, HandlerFault>;
}

/// Write-once downstream slot shared by the connections that have one.
#[derive(Default)]
pub(crate) struct DownstreamSlot(OnceLock<Arc<dyn Downstream>>);

impl DownstreamSlot {
    pub(crate) fn attach<H: Handler + 'static>(
        &self,
        handler: H,
        upstream: Arc<dyn Sender>,
    ) -> Result<Arc<HandlerConnected<H>>, HandlerFault> {
        if self.0.get().is_some() {
            return Err(HandlerFault::DownstreamAlreadySet);
        }
        let connected = Arc::new(HandlerConnected::connect(handler, upstream));
        self.0
            .set(connected.clone())
            .map_err(|_| HandlerFault::DownstreamAlreadySet)?;
        Ok(connected)
    }

    pub(crate) fn forward(&self, input: &[u8]) -> Result<(), HandlerFault> {
        self.0
            .get()
            .ok_or(HandlerFault::DownstreamNotSet)?
            .on_receive(input)
    }
}

/// Prepends a fixed prefix to everything sent through it.
pub(crate) struct PrefixSender {
    upstream: Arc<dyn Sender>,
    prefix: Vec<u8>,
}

impl PrefixSender {
    pub(crate) fn new(upstream: Arc<dyn Sender>, prefix: Vec<u8>) -> Self {
        Self { upstream, prefix }
    }
}

impl Sender for PrefixSender {
    fn send(&self, len: usize, writer: &mut dyn FnMut(&mut Vec<u8>)) {
        self.upstream.send(self.prefix.len() + len, &mut |buf| {
            buf.extend_from_slice(&self.prefix);
            writer(buf);
        });
    }
}
