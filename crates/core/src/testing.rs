//! Transports and handlers that record what passes through them.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::{
    error::HandlerFault,
    handler::{Downstream, Handler, Sender},
};

#[derive(Default)]
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSender {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }
}

impl Sender for RecordingSender {
    fn send(&self, len: usize, writer: &mut dyn FnMut(&mut Vec<u8>)) {
        let mut buf = Vec::with_capacity(len);
        writer(&mut buf);
        assert_eq!(buf.len(), len, "writer produced a different length");
        self.sent.lock().push(buf);
    }
}

/// Records inbound buffers and keeps its upstream so tests can reply.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    received: Mutex<Vec<Vec<u8>>>,
}

impl RecordingHandler {
    pub(crate) fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().clone()
    }
}

pub(crate) struct RecordingConnection {
    pub(crate) upstream: Arc<dyn Sender>,
}

impl RecordingConnection {
    pub(crate) fn send(&self, bytes: &[u8]) {
        self.upstream
            .send(bytes.len(), &mut |buf| buf.extend_from_slice(bytes));
    }
}

impl Handler for RecordingHandler {
    type Connection = RecordingConnection;

    fn connect(&self, upstream: Arc<dyn Sender>) -> Self::Connection {
        RecordingConnection { upstream }
    }

    fn on_receive(&self, _connection: &Self::Connection, input: &[u8]) -> Result<(), HandlerFault> {
        self.received.lock().push(input.to_vec());
        Ok(())
    }
}

/// A handler whose every receive fails with the given fault.
pub(crate) struct FailingHandler(pub(crate) HandlerFault);

impl Handler for FailingHandler {
    type Connection = ();

    fn connect(&self, _upstream: Arc<dyn Sender>) -> Self::Connection {}

    fn on_receive(&self, _connection: &Self::Connection, _input: &[u8]) -> Result<(), HandlerFault> {
        Err(self.0.clone())
    }
}

/// One direction of an in-memory link: delivers each message to the peer's
/// chain root synchronously.
#[derive(Default)]
pub(crate) struct Loopback {
    peer: OnceLock<Arc<dyn Downstream>>,
}

impl Loopback {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn connect_to(&self, peer: Arc<dyn Downstream>) {
        assert!(self.peer.set(peer).is_ok(), "loopback already connected");
    }
}

impl Sender for Loopback {
    fn send(&self, len: usize, writer: &mut dyn FnMut(&mut Vec<u8>)) {
        let mut buf = Vec::with_capacity(len);
        writer(&mut buf);
        self.peer
            .get()
            .expect("loopback not connected")
            .on_receive(&buf)
            .expect("peer rejected message");
    }
}
