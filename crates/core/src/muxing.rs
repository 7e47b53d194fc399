//! Several independent channels over one connection. Each frame starts with
//! the big-endian `u32` id of its channel.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use bastion_wire::Cursor;
use log::debug;
use parking_lot::RwLock;

use crate::{
    error::HandlerFault,
    handler::{Downstream, Handler, HandlerConnected, PrefixSender, Sender},
};

#[derive(Clone, Copy, Debug, Default)]
pub struct MuxingHandler;

pub struct MuxConnection {
    upstream: Arc<dyn Sender>,
    channels: RwLock<HashMap<u32, Arc<dyn Downstream>>>,
    next_id: AtomicU32,
}

impl MuxConnection {
    /// Connects `handler` on a new channel. Ids are handed out in order
    /// starting at zero, so both ends agree as long as they add channels in
    /// the same order.
    pub fn add_channel<H: Handler + 'static>(&self, handler: H) -> (u32, Arc<HandlerConnected<H>>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let sender = Arc::new(PrefixSender::new(
            self.upstream.clone(),
            id.to_be_bytes().to_vec(),
        ));
        let connected = Arc::new(HandlerConnected::connect(handler, sender));
        self.channels.write().insert(id, connected.clone());
        debug!("Added channel {id}");
        (id, connected)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }
}

impl Handler for MuxingHandler {
    type Connection = MuxConnection;

    fn connect(&self, upstream: Arc<dyn Sender>) -> Self::Connection {
        MuxConnection {
            upstream,
            channels: RwLock::default(),
            next_id: AtomicU32::new(0),
        }
    }

    fn on_receive(&self, connection: &Self::Connection, input: &[u8]) -> Result<(), HandlerFault> {
        let mut cursor = Cursor::new(input);
        let id = cursor.get_u32().map_err(HandlerFault::Truncated)?;
        // the lock is released before the channel runs so it can add channels
        let channel = connection
            .channels
            .read()
            .get(&id)
            .cloned()
            .ok_or(HandlerFault::UnknownChannel(id))?;
        channel.on_receive(cursor.rest())
    }
}
