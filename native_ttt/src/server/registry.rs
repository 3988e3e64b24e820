//! Process-wide map from session id to its running task.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use ttt_shared::Symbol;

use super::session::SessionHandle;
use crate::error::JoinError;
use crate::transport::{ConnectionId, Outbox};

pub(crate) type SessionMap = Arc<Mutex<HashMap<String, SessionHandle>>>;

/// Owns every live session.
///
/// The map lock only covers lookup, creation and removal; seat changes go
/// through the session's own queue. A session removes its entry itself once
/// its last seat is gone.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: SessionMap,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `id`, starting a fresh one if none exists.
    pub async fn get_or_create(&self, id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(id) {
            return handle.clone();
        }
        tracing::info!(session_id = %id, "session created");
        let handle = SessionHandle::spawn(id, self.sessions.clone());
        sessions.insert(id.to_owned(), handle.clone());
        handle
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "session closed");
        }
        removed
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.lock().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Seat a new connection in session `id`, creating the session on demand.
    ///
    /// A handle that turns out to belong to a session which emptied in the
    /// meantime is discarded and the join retried on a fresh one.
    pub async fn join(
        &self,
        id: &str,
        outbox: Outbox,
    ) -> Result<(SessionHandle, ConnectionId, Symbol), JoinError> {
        let conn = ConnectionId::next();
        loop {
            let handle = self.get_or_create(id).await;
            match handle.join(conn, outbox.clone()).await {
                Ok(symbol) => return Ok((handle, conn, symbol)),
                Err(JoinError::SessionClosed) => self.forget(&handle).await,
                Err(e) => return Err(e),
            }
        }
    }

    /// Release a seat and return how many remain. An emptied session has
    /// already left the registry when this returns.
    pub async fn leave(&self, handle: &SessionHandle, conn: ConnectionId) -> usize {
        handle.leave(conn).await
    }

    /// Remove `handle`'s entry if it is still the one registered under its id.
    async fn forget(&self, handle: &SessionHandle) {
        let mut sessions = self.sessions.lock().await;
        if sessions
            .get(handle.id())
            .is_some_and(|h| h.same_session(handle))
        {
            sessions.remove(handle.id());
        }
    }
}
