//! In-memory chain implementing both collaborators.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use super::failure::{ChainOp, FailureConfig, FailureInjector};
use crate::collab::{Broadcaster, ChunkHit, CollabError, IndexClient};
use oip_wire::{is_multipart, Multipart, FLODATA_MAX_LEN};

#[derive(Debug, Default)]
struct ChainState {
    /// txid -> transaction data
    records: BTreeMap<String, String>,
    /// txids in anchoring order
    order: Vec<String>,
    /// txids the index pretends not to know
    hidden: BTreeSet<String>,
}

/// Mock chain for tests and the CLI.
///
/// Every broadcast is anchored immediately under `sha256(height || data)`.
/// Inline data is capped at the transaction limit; chunks must pass framing
/// checks. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
    failures: Arc<Mutex<FailureInjector>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test configuration ===

    /// Anchor data directly, bypassing failure injection.
    pub fn insert(&self, data: &str) -> String {
        let mut state = self.state.lock().unwrap();
        anchor(&mut state, data)
    }

    /// Make `txid` invisible to fetches and searches.
    pub fn hide(&self, txid: &str) {
        self.state.lock().unwrap().hidden.insert(txid.to_string());
    }

    pub fn inject_failure(&self, op: ChainOp, config: FailureConfig) {
        self.failures.lock().unwrap().inject(op, config);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    // === Inspection ===

    pub fn data(&self, txid: &str) -> Option<String> {
        self.state.lock().unwrap().records.get(txid).cloned()
    }

    /// Number of anchored transactions.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All txids in anchoring order.
    pub fn txids(&self) -> Vec<String> {
        self.state.lock().unwrap().order.clone()
    }

    fn check_failure(&self, op: ChainOp) -> Result<(), CollabError> {
        match self.failures.lock().unwrap().check(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn anchor(state: &mut ChainState, data: &str) -> String {
    let height = state.order.len() as u64;
    let mut hasher = Sha256::new();
    hasher.update(height.to_be_bytes());
    hasher.update(data.as_bytes());
    let txid = hex::encode(hasher.finalize());

    state.records.insert(txid.clone(), data.to_string());
    state.order.push(txid.clone());
    txid
}

impl Broadcaster for MockChain {
    fn broadcast(&self, data: &str) -> Result<String, CollabError> {
        self.check_failure(ChainOp::Broadcast)?;
        if is_multipart(data) {
            let part = Multipart::parse(data).map_err(|e| CollabError::Rejected(e.to_string()))?;
            part.validate()
                .map_err(|e| CollabError::Rejected(e.to_string()))?;
        } else if data.len() > FLODATA_MAX_LEN {
            return Err(CollabError::Rejected(format!(
                "transaction data is {} bytes, limit is {}",
                data.len(),
                FLODATA_MAX_LEN
            )));
        }
        let mut state = self.state.lock().unwrap();
        Ok(anchor(&mut state, data))
    }
}

impl IndexClient for MockChain {
    fn fetch_by_txid(&self, txid: &str) -> Result<Option<String>, CollabError> {
        self.check_failure(ChainOp::Fetch)?;
        let state = self.state.lock().unwrap();
        if state.hidden.contains(txid) {
            return Ok(None);
        }
        Ok(state.records.get(txid).cloned())
    }

    fn search_chunks_by_prefix(&self, prefix: &str) -> Result<Vec<ChunkHit>, CollabError> {
        self.check_failure(ChainOp::Search)?;
        let state = self.state.lock().unwrap();
        let hits = state
            .order
            .iter()
            .filter(|txid| !state.hidden.contains(*txid))
            .filter_map(|txid| {
                let data = state.records.get(txid)?;
                if !is_multipart(data) {
                    return None;
                }
                let reference = Multipart::parse(data).ok()?.first_part_reference?;
                reference.starts_with(prefix).then(|| ChunkHit {
                    payload: data.clone(),
                    transport_id: txid.clone(),
                })
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_and_fetch() {
        let chain = MockChain::new();
        let txid = chain.broadcast("json:{}").unwrap();
        assert_eq!(txid.len(), 64);
        assert_eq!(chain.fetch_by_txid(&txid).unwrap().as_deref(), Some("json:{}"));
        assert_eq!(chain.fetch_by_txid("00").unwrap(), None);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_same_data_gets_distinct_txids() {
        let chain = MockChain::new();
        let a = chain.broadcast("x").unwrap();
        let b = chain.broadcast("x").unwrap();
        assert_ne!(a, b);
        assert_eq!(chain.txids(), [a, b]);
    }

    #[test]
    fn test_oversized_data_rejected() {
        let chain = MockChain::new();
        let err = chain.broadcast(&"x".repeat(FLODATA_MAX_LEN + 1)).unwrap_err();
        assert!(matches!(err, CollabError::Rejected(_)));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_malformed_chunk_rejected() {
        let chain = MockChain::new();
        let err = chain.broadcast(&format!("oip-mp(0,1,FAddr,,):{}", "x".repeat(891))).unwrap_err();
        assert!(matches!(err, CollabError::Rejected(_)));
        assert!(chain.broadcast("oip-mp(3,1,FAddr,,):x").is_err());
    }

    #[test]
    fn test_search_by_reference_prefix() {
        let chain = MockChain::new();
        let first = chain.insert("oip-mp(0,1,FAddr,,):{\"a\"");
        let second = chain.insert(&format!("oip-mp(1,1,FAddr,{},):1}}", first));
        chain.insert("json:{\"unrelated\":true}");

        let hits = chain.search_chunks_by_prefix(&first[..10]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].transport_id, second);

        chain.hide(&second);
        assert!(chain.search_chunks_by_prefix(&first[..10]).unwrap().is_empty());
    }

    #[test]
    fn test_injected_failure() {
        let chain = MockChain::new();
        chain.inject_failure(ChainOp::Broadcast, FailureConfig::unavailable("offline").after(1));
        assert!(chain.broadcast("a").is_ok());
        assert!(matches!(chain.broadcast("b"), Err(CollabError::Unavailable(_))));
        chain.clear_failures();
        assert!(chain.broadcast("b").is_ok());
    }
}
