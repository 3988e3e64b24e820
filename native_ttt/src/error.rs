use thiserror::Error;

/// Why a connection could not be seated in a session.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    #[error("session already has two seated players")]
    SessionFull,
    #[error("session task is no longer running")]
    SessionClosed,
}

/// Why a message could not be queued for a peer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    Full,
    #[error("peer connection is closed")]
    Closed,
}
