//! One task per session. Connection handlers never touch a `Session`
//! directly; they push commands into its queue and the task applies them
//! one at a time.
//!
//! The moment the seat list empties, whether by departure or by eviction,
//! the task removes its own registry entry and refuses further joins. A
//! joiner holding a stale handle gets `JoinError::SessionClosed` and the
//! registry retries against a fresh session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use ttt_shared::Symbol;

use super::registry::SessionMap;
use crate::error::JoinError;
use crate::game::{Session, SessionSnapshot};
use crate::transport::{ConnectionId, Outbox};

pub const COMMAND_BUFFER_SIZE: usize = 64;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub(crate) enum SessionCommand {
    Join {
        conn: ConnectionId,
        outbox: Outbox,
        reply: oneshot::Sender<Result<Symbol, JoinError>>,
    },
    Move {
        conn: ConnectionId,
        row: usize,
        col: usize,
    },
    Rematch {
        conn: ConnectionId,
    },
    Leave {
        conn: ConnectionId,
        reply: oneshot::Sender<usize>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cloneable producer side of a session task.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: Arc<str>,
    generation: u64,
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Start the owning task for a fresh session registered in `sessions`.
    /// Requires a tokio runtime.
    pub(crate) fn spawn(id: &str, sessions: SessionMap) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let task = SessionTask {
            session: Session::new(id),
            generation,
            sessions,
            closed: false,
        };
        tokio::spawn(task.run(rx));
        Self {
            id: id.into(),
            generation,
            tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when both handles feed the same task.
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        self.generation == other.generation
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn join(&self, conn: ConnectionId, outbox: Outbox) -> Result<Symbol, JoinError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Join {
                conn,
                outbox,
                reply,
            })
            .await
            .map_err(|_| JoinError::SessionClosed)?;
        rx.await.map_err(|_| JoinError::SessionClosed)?
    }

    pub async fn make_move(&self, conn: ConnectionId, row: usize, col: usize) {
        self.submit(SessionCommand::Move { conn, row, col }).await;
    }

    pub async fn request_rematch(&self, conn: ConnectionId) {
        self.submit(SessionCommand::Rematch { conn }).await;
    }

    /// Release `conn`'s seat and return the number of seats still taken.
    pub async fn leave(&self, conn: ConnectionId) -> usize {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(SessionCommand::Leave { conn, reply }).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(SessionCommand::Snapshot { reply }).await.ok()?;
        rx.await.ok()
    }

    async fn submit(&self, cmd: SessionCommand) {
        if self.tx.send(cmd).await.is_err() {
            tracing::debug!(session_id = %self.id, "session task gone, dropping command");
        }
    }
}

struct SessionTask {
    session: Session,
    generation: u64,
    sessions: SessionMap,
    /// Set once the last seat is gone; only departures are served afterwards.
    closed: bool,
}

impl SessionTask {
    async fn run(mut self, mut rx: mpsc::Receiver<SessionCommand>) {
        tracing::debug!(session_id = %self.session.id(), "session task started");
        while let Some(cmd) = rx.recv().await {
            match cmd {
                SessionCommand::Join {
                    conn,
                    outbox,
                    reply,
                } => {
                    if self.closed {
                        let _ = reply.send(Err(JoinError::SessionClosed));
                        continue;
                    }
                    let result = self.session.join(conn, outbox);
                    // start_game may have evicted both seats
                    self.close_if_empty().await;
                    let _ = reply.send(result);
                }
                SessionCommand::Move { conn, row, col } => {
                    // A connection evicted earlier may still be sending; it has no symbol now.
                    if let Some(symbol) = self.session.symbol_of(conn) {
                        self.session.apply_move(symbol, row, col);
                        self.close_if_empty().await;
                    }
                }
                SessionCommand::Rematch { conn } => {
                    if let Some(symbol) = self.session.symbol_of(conn) {
                        self.session.request_rematch(symbol);
                        self.close_if_empty().await;
                    }
                }
                SessionCommand::Leave { conn, reply } => {
                    let remaining = self.session.leave(conn);
                    self.close_if_empty().await;
                    let _ = reply.send(remaining);
                }
                SessionCommand::Snapshot { reply } => {
                    let _ = reply.send(self.session.snapshot());
                }
            }
        }
        tracing::debug!(session_id = %self.session.id(), "session task finished");
    }

    /// Drop the registry entry as soon as no seat is left. Runs before the
    /// triggering command is answered, so callers observe the removal.
    async fn close_if_empty(&mut self) {
        if self.closed || !self.session.is_empty() {
            return;
        }
        self.closed = true;
        let mut sessions = self.sessions.lock().await;
        let current = sessions
            .get(self.session.id())
            .is_some_and(|h| h.generation() == self.generation);
        if current {
            sessions.remove(self.session.id());
            tracing::info!(session_id = %self.session.id(), "session closed");
        }
    }
}
