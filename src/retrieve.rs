//! Looking records up through an [`IndexClient`].

use regex_lite::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::Artifact;
use crate::collab::{CollabError, IndexClient};
use crate::config::Settings;
use crate::error::{DecodeError, ReassemblyError};
use crate::multipart::{is_multipart, reassemble};
use oip_wire::{ErrorCode, Multipart, WireError};

/// Retrieval errors
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("not a transaction id: {0}")]
    InvalidTxid(String),

    #[error("no transaction {0}")]
    NotFound(String),

    #[error(transparent)]
    Collab(#[from] CollabError),

    #[error("chunk {txid}: {source}")]
    Chunk {
        txid: String,
        #[source]
        source: WireError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
}

impl RetrieveError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RetrieveError::InvalidTxid(_) | RetrieveError::NotFound(_) => ErrorCode::MalformedInput,
            RetrieveError::Collab(e) => e.code(),
            RetrieveError::Chunk { source, .. } => source.code,
            RetrieveError::Decode(e) => e.code(),
            RetrieveError::Reassembly(e) => e.code(),
        }
    }
}

fn txid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{1,64}$").expect("txid pattern is valid"))
}

/// Resolves transaction ids to decoded artifacts.
///
/// Inline records decode directly. A chunk, whichever part it is, leads to
/// chunk 0; the rest of the set is found by searching for chunks that
/// reference chunk 0's txid by its first `prefix_len` characters.
pub struct Retriever<I> {
    index: I,
    prefix_len: usize,
}

impl<I: IndexClient> Retriever<I> {
    pub fn new(index: I) -> Self {
        Self {
            index,
            prefix_len: crate::config::DEFAULT_SEARCH_PREFIX_LEN,
        }
    }

    pub fn from_settings(index: I, settings: &Settings) -> Self {
        Self::new(index).with_prefix_len(settings.index.search_prefix_len)
    }

    pub fn with_prefix_len(mut self, prefix_len: usize) -> Self {
        self.prefix_len = prefix_len.max(1);
        self
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn get_artifact(&self, txid: &str) -> Result<Artifact, RetrieveError> {
        if !txid_pattern().is_match(txid) {
            return Err(RetrieveError::InvalidTxid(txid.to_string()));
        }
        let data = self.fetch(txid)?;

        let artifact = if is_multipart(&data) {
            let part = parse_chunk(&data, txid)?;
            let first = if part.is_first_part() {
                part
            } else {
                let reference = part.first_part_reference.clone().ok_or_else(|| {
                    RetrieveError::Chunk {
                        txid: txid.to_string(),
                        source: WireError::missing_field("firstPartTxid"),
                    }
                })?;
                debug!(%txid, first = %reference, "following chunk to its first part");
                let first_data = self.fetch(&reference)?;
                parse_chunk(&first_data, &reference)?
            };
            self.collect_and_reassemble(first)?
        } else {
            let mut artifact = Artifact::from_serialized_string(&data)?;
            if artifact.txid().is_none() {
                artifact.set_txid(txid);
            }
            artifact
        };

        info!(
            txid = artifact.txid().unwrap_or(txid),
            title = artifact.title(),
            "retrieved record"
        );
        Ok(artifact)
    }

    /// Fetch several records; each id gets its own result.
    pub fn get_artifacts<'a, T>(&self, txids: T) -> Vec<(String, Result<Artifact, RetrieveError>)>
    where
        T: IntoIterator<Item = &'a str>,
    {
        txids
            .into_iter()
            .map(|txid| (txid.to_string(), self.get_artifact(txid)))
            .collect()
    }

    fn fetch(&self, txid: &str) -> Result<String, RetrieveError> {
        self.index
            .fetch_by_txid(txid)?
            .ok_or_else(|| RetrieveError::NotFound(txid.to_string()))
    }

    fn collect_and_reassemble(&self, first: Multipart) -> Result<Artifact, RetrieveError> {
        let first_txid = first.transport_id.clone().unwrap_or_default();
        let prefix: String = first_txid.chars().take(self.prefix_len).collect();
        let hits = self.index.search_chunks_by_prefix(&prefix)?;

        let mut candidates = vec![first];
        for hit in hits {
            match Multipart::parse_anchored(&hit.payload, hit.transport_id.as_str()) {
                Ok(part) if part.is_first_part() => {}
                Ok(part) => candidates.push(part),
                Err(err) => debug!(txid = %hit.transport_id, %err, "skipping malformed chunk"),
            }
        }
        debug!(%prefix, candidates = candidates.len(), "collected chunks");
        Ok(reassemble(&candidates, &first_txid)?)
    }
}

fn parse_chunk(data: &str, txid: &str) -> Result<Multipart, RetrieveError> {
    Multipart::parse_anchored(data, txid).map_err(|source| RetrieveError::Chunk {
        txid: txid.to_string(),
        source,
    })
}
