//! Error types shared by the store, pubsub, service and message queue

use std::fmt;

use crate::models::MessageStatus;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core components
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The store has been closed and holds no data anymore
    StoreClosed,

    /// The pubsub has been closed and accepts no more events
    PubSubClosed,

    /// A vital failed validation at the service boundary
    InvalidVital(String),

    /// A queued message id has no entry in the message ledger
    UnknownMessage(u64),

    /// A message was asked to move backwards (or sideways) in its lifecycle
    InvalidTransition {
        id: u64,
        from: MessageStatus,
        to: MessageStatus,
    },
}

impl Error {
    /// Whether this error signals use of a component after shutdown
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::StoreClosed | Error::PubSubClosed)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::StoreClosed => write!(f, "store is closed"),
            Error::PubSubClosed => write!(f, "pubsub is closed"),
            Error::InvalidVital(msg) => write!(f, "invalid vital: {}", msg),
            Error::UnknownMessage(id) => write!(f, "message {} is not in the ledger", id),
            Error::InvalidTransition { id, from, to } => {
                write!(f, "message {}: invalid transition {} -> {}", id, from, to)
            }
        }
    }
}

impl std::error::Error for Error {}
