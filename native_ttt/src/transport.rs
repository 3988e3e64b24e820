//! Outbound delivery to connected peers.
//!
//! Every connection owns the receiving half of a bounded queue; the session
//! only ever sees the sending half ([`Outbox`]). Delivery never waits, so one
//! slow peer cannot hold up the rest of a broadcast.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};
use ttt_shared::ServerMsg;

use crate::error::DeliveryError;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier for one accepted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub fn next() -> Self {
        ConnectionId(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sending half of a connection's outbound queue.
#[derive(Clone, Debug)]
pub struct Outbox(mpsc::Sender<ServerMsg>);

impl Outbox {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ServerMsg>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Outbox(tx), rx)
    }

    pub fn deliver(&self, msg: ServerMsg) -> Result<(), DeliveryError> {
        self.0.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Deliver `msg` to every recipient independently.
///
/// Returns the connections that could not take the message, in recipient order.
pub fn broadcast<'a, I>(recipients: I, msg: &ServerMsg) -> Vec<ConnectionId>
where
    I: IntoIterator<Item = (ConnectionId, &'a Outbox)>,
{
    let mut failed = Vec::new();
    for (conn, outbox) in recipients {
        if let Err(e) = outbox.deliver(msg.clone()) {
            tracing::warn!(%conn, error = %e, "failed to deliver server message");
            failed.push(conn);
        }
    }
    failed
}
