//! Fragmentation planning.

use tracing::debug;

use super::chunk_set::ChunkSet;
use crate::artifact::{Artifact, TransportState};
use crate::error::EncodeError;
use oip_wire::{Multipart, CHOP_MAX_LEN, FLODATA_MAX_LEN, GENERATION_OIP042, JSON_PREFIX};

/// How a serialized record travels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Written as one transaction.
    Inline(String),
    /// Split into chunks. `reused` is set when a held set already matched.
    Multipart { chunks: ChunkSet, reused: bool },
}

impl Transport {
    pub fn is_inline(&self) -> bool {
        matches!(self, Transport::Inline(_))
    }

    pub fn chunks(&self) -> Option<&ChunkSet> {
        match self {
            Transport::Inline(_) => None,
            Transport::Multipart { chunks, .. } => Some(chunks),
        }
    }
}

/// Splits serialized records into chunks.
pub struct MultipartCodec;

impl MultipartCodec {
    /// Plan the transport for `serialized`.
    pub fn fragment(serialized: &str, publisher: &str) -> Transport {
        Self::fragment_reusing(serialized, publisher, None)
    }

    /// Plan the transport, reusing `previous` if it already carries exactly
    /// `serialized`.
    pub fn fragment_reusing(
        serialized: &str,
        publisher: &str,
        previous: Option<&ChunkSet>,
    ) -> Transport {
        if serialized.len() <= FLODATA_MAX_LEN {
            return Transport::Inline(serialized.to_string());
        }

        if let Some(previous) = previous {
            if previous.reassemble_string().ok().as_deref() == Some(serialized) {
                debug!(parts = previous.len(), "held chunk set still matches, reusing");
                return Transport::Multipart {
                    chunks: previous.clone(),
                    reused: true,
                };
            }
        }

        let slices = split_on_char_boundaries(serialized, CHOP_MAX_LEN);
        let total_parts = u32::try_from(slices.len() - 1).unwrap_or(u32::MAX);
        let prefixed = has_generation_prefix(serialized);
        let parts = slices
            .into_iter()
            .enumerate()
            .map(|(index, slice)| {
                let mut part = Multipart::new(index as u32, total_parts, publisher, slice);
                part.has_generation_prefix = index == 0 && prefixed;
                part
            })
            .collect();

        debug!(
            bytes = serialized.len(),
            parts = total_parts + 1,
            "fragmented record"
        );
        Transport::Multipart {
            chunks: ChunkSet::new(parts),
            reused: false,
        }
    }
}

/// True if `serialized`, after an optional `json:` marker, opens with one of
/// the generation wrappers.
pub fn has_generation_prefix(serialized: &str) -> bool {
    let body = serialized.strip_prefix(JSON_PREFIX).unwrap_or(serialized);
    let wrappers = [
        format!("{{\"{}\"", GENERATION_OIP042),
        "{\"oip-041\"".to_string(),
        "{\"media-data\"".to_string(),
    ];
    wrappers.iter().any(|w| body.starts_with(w.as_str()))
}

/// Cut `data` into slices of at most `max` bytes without splitting a
/// UTF-8 scalar.
fn split_on_char_boundaries(data: &str, max: usize) -> Vec<&str> {
    let mut slices = Vec::new();
    let mut rest = data;
    while rest.len() > max {
        let mut cut = max;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        slices.push(head);
        rest = tail;
    }
    slices.push(rest);
    slices
}

impl Artifact {
    /// Encode the record and plan its transport.
    ///
    /// A held chunk set is reused when it still reassembles to the current
    /// canonical form; otherwise it is replaced.
    pub fn prepare_transport(&mut self) -> Result<Transport, EncodeError> {
        let serialized = self.to_canonical_form()?;
        if serialized.len() > FLODATA_MAX_LEN {
            self.transport_state = TransportState::Fragmenting;
        }
        let transport =
            MultipartCodec::fragment_reusing(&serialized, &self.address, self.chunks.as_ref());
        self.store_chunk_set(transport.chunks().cloned());
        Ok(transport)
    }
}
