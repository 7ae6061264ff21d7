//! Publishing records through a [`Broadcaster`].
//!
//! Order of work for one record:
//! 1. Validate, stamp the time if unset, sign the record.
//! 2. Plan the transport from the canonical form.
//! 3. Inline: write `json:<canonical>`.
//!    Chunks: write chunk 0, link the rest to its txid, sign and write them
//!    in order. Chunks that already carry a txid are not written again, so a
//!    failed publish can be resumed by calling [`Publisher::publish`] again.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::Artifact;
use crate::collab::{Broadcaster, CollabError};
use crate::error::{EncodeError, ValidationError};
use crate::multipart::{ChunkSet, Transport};
use crate::signing::RecordSigner;
use oip_wire::{ErrorCode, Multipart, JSON_PREFIX};

/// Publish errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("record is not publishable: {0}")]
    Invalid(#[from] ValidationError),

    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("signer address {signer} does not match record address {record}")]
    SignerMismatch { signer: String, record: String },

    #[error("broadcast of {stage} failed: {source}")]
    Broadcast {
        stage: String,
        #[source]
        source: CollabError,
    },
}

impl PublishError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PublishError::Invalid(e) => e.code(),
            PublishError::Encode(e) => e.code(),
            PublishError::SignerMismatch { .. } => ErrorCode::InvalidForPublish,
            PublishError::Broadcast { source, .. } => source.code(),
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction ids, chunk order for chunked records.
    pub txids: Vec<String>,
    /// True when an already anchored chunk set was reused as is.
    pub reused: bool,
    /// SHA-256 of the published canonical form.
    pub fingerprint: String,
}

impl Receipt {
    /// The id the record is addressed by.
    pub fn txid(&self) -> Option<&str> {
        self.txids.first().map(String::as_str)
    }
}

pub struct Publisher<B> {
    broadcaster: B,
    signer: Option<Box<dyn RecordSigner>>,
}

impl<B: Broadcaster> Publisher<B> {
    pub fn new(broadcaster: B) -> Self {
        Self {
            broadcaster,
            signer: None,
        }
    }

    /// Sign records and chunks with `signer`.
    pub fn with_signer(mut self, signer: impl RecordSigner + 'static) -> Self {
        self.signer = Some(Box::new(signer));
        self
    }

    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    pub fn publish(&self, artifact: &mut Artifact) -> Result<Receipt, PublishError> {
        if let Some(signer) = &self.signer {
            let address = signer.address();
            if artifact.address().is_empty() {
                artifact.set_address(address);
            } else if artifact.address() != address {
                return Err(PublishError::SignerMismatch {
                    signer: address,
                    record: artifact.address().to_string(),
                });
            }
        }
        artifact.validate()?;

        if artifact.timestamp().is_none() {
            artifact.set_timestamp(Utc::now().timestamp());
        }
        if let Some(signer) = &self.signer {
            let signature = signer.sign(artifact.signing_preimage().as_bytes());
            artifact.set_signature(signature);
        }

        let fingerprint = artifact.fingerprint()?;
        let receipt = match artifact.prepare_transport()? {
            Transport::Inline(serialized) => {
                let data = format!("{}{}", JSON_PREFIX, serialized);
                let txid = self
                    .broadcaster
                    .broadcast(&data)
                    .map_err(|source| PublishError::Broadcast {
                        stage: "record".to_string(),
                        source,
                    })?;
                Receipt {
                    txids: vec![txid],
                    reused: false,
                    fingerprint,
                }
            }
            Transport::Multipart { mut chunks, reused } => {
                if reused && chunks.is_fully_anchored() {
                    debug!("chunk set already anchored, nothing to broadcast");
                } else {
                    let outcome = self.broadcast_chunks(&mut chunks);
                    artifact.store_chunk_set(Some(chunks.clone()));
                    outcome?;
                }
                Receipt {
                    txids: chunks.transport_ids().into_iter().map(String::from).collect(),
                    reused: reused && chunks.is_fully_anchored(),
                    fingerprint,
                }
            }
        };

        if let Some(txid) = receipt.txid() {
            artifact.set_txid(txid);
        }
        info!(
            txid = receipt.txid().unwrap_or(""),
            transactions = receipt.txids.len(),
            reused = receipt.reused,
            "published record"
        );
        Ok(receipt)
    }

    fn broadcast_chunks(&self, chunks: &mut ChunkSet) -> Result<(), PublishError> {
        let first_txid = {
            let first = chunks.parts_mut().first_mut().ok_or_else(|| {
                EncodeError::Canonicalization("chunk set has no first part".to_string())
            })?;
            match first.transport_id.clone() {
                Some(txid) => txid,
                None => {
                    self.sign_part(first);
                    self.write_part(first)?
                }
            }
        };
        chunks.link_to_first(&first_txid);

        for part in chunks.parts_mut().iter_mut().skip(1) {
            if part.transport_id.is_some() {
                continue;
            }
            self.sign_part(part);
            let txid = self.write_part(part)?;
            part.transport_id = Some(txid);
        }
        Ok(())
    }

    fn sign_part(&self, part: &mut Multipart) {
        if let Some(signer) = &self.signer {
            part.signature = Some(signer.sign(part.signing_preimage().as_bytes()));
        }
    }

    fn write_part(&self, part: &Multipart) -> Result<String, PublishError> {
        let txid = self
            .broadcaster
            .broadcast(&part.to_wire())
            .map_err(|source| PublishError::Broadcast {
                stage: format!("chunk {} of {}", part.part_number, part.chunk_count()),
                source,
            })?;
        debug!(part = part.part_number, %txid, "anchored chunk");
        Ok(txid)
    }
}
