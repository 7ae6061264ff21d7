//! Interfaces to the index service and the transaction broadcaster.
//!
//! Both are driven synchronously; whatever I/O, retry or timeout policy they
//! need lives inside the implementation.

use oip_wire::ErrorCode;

/// Errors reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollabError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl CollabError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::CollaboratorFailure
    }
}

/// One search hit: raw transaction data and the id it is anchored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHit {
    pub payload: String,
    pub transport_id: String,
}

/// Read access to anchored transaction data.
pub trait IndexClient: Send + Sync {
    /// Raw transaction data of one transaction, `None` if unknown.
    fn fetch_by_txid(&self, txid: &str) -> Result<Option<String>, CollabError>;

    /// Chunks whose data references a first part starting with `prefix`.
    fn search_chunks_by_prefix(&self, prefix: &str) -> Result<Vec<ChunkHit>, CollabError>;
}

/// Writes transaction data and reports the id it was anchored under.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, data: &str) -> Result<String, CollabError>;
}

impl<T: IndexClient + ?Sized> IndexClient for &T {
    fn fetch_by_txid(&self, txid: &str) -> Result<Option<String>, CollabError> {
        (**self).fetch_by_txid(txid)
    }

    fn search_chunks_by_prefix(&self, prefix: &str) -> Result<Vec<ChunkHit>, CollabError> {
        (**self).search_chunks_by_prefix(prefix)
    }
}

impl<T: Broadcaster + ?Sized> Broadcaster for &T {
    fn broadcast(&self, data: &str) -> Result<String, CollabError> {
        (**self).broadcast(data)
    }
}
