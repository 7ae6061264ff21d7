//! An ordered set of chunks carrying one serialized record.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ReassemblyError;
use oip_wire::Multipart;

/// Chunks of one record, kept sorted by part number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSet {
    parts: Vec<Multipart>,
}

impl ChunkSet {
    /// Build a set from chunks in any order.
    pub fn new(mut parts: Vec<Multipart>) -> Self {
        parts.sort_by_key(|p| p.part_number);
        Self { parts }
    }

    pub fn parts(&self) -> &[Multipart] {
        &self.parts
    }

    pub(crate) fn parts_mut(&mut self) -> &mut [Multipart] {
        &mut self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Chunk 0, if present.
    pub fn first(&self) -> Option<&Multipart> {
        self.parts.first().filter(|p| p.is_first_part())
    }

    /// Declared index of the last chunk, taken from the lowest part held.
    pub fn total_parts(&self) -> Option<u32> {
        self.parts.first().map(|p| p.total_parts)
    }

    /// Part numbers in `0..=max` not present in the set.
    pub fn missing_parts(&self) -> Vec<u32> {
        let Some(max) = self.total_parts() else {
            return vec![0];
        };
        (0..=max)
            .filter(|n| !self.parts.iter().any(|p| p.part_number == *n))
            .collect()
    }

    /// Concatenate payloads in part order.
    ///
    /// Fails unless the set is exactly one contiguous run `0..=max` with a
    /// consistent `max`. Identical duplicates are tolerated; conflicting ones
    /// are not.
    pub fn reassemble_string(&self) -> Result<String, ReassemblyError> {
        let Some(max) = self.total_parts() else {
            return Err(ReassemblyError::Corrupt("no chunks".into()));
        };
        if let Some(odd) = self.parts.iter().find(|p| p.total_parts != max) {
            return Err(ReassemblyError::Corrupt(format!(
                "part {} declares {} as last index, expected {}",
                odd.part_number, odd.total_parts, max
            )));
        }
        if let Some(stray) = self.parts.iter().find(|p| p.part_number > max) {
            return Err(ReassemblyError::Corrupt(format!(
                "part {} is beyond last index {}",
                stray.part_number, max
            )));
        }

        let mut joined = String::new();
        let mut previous: Option<&Multipart> = None;
        for part in &self.parts {
            if let Some(prev) = previous.filter(|p| p.part_number == part.part_number) {
                if prev.payload != part.payload {
                    return Err(ReassemblyError::Corrupt(format!(
                        "conflicting copies of part {}",
                        part.part_number
                    )));
                }
                continue;
            }
            joined.push_str(&part.payload);
            previous = Some(part);
        }

        let missing = self.missing_parts();
        if !missing.is_empty() {
            return Err(ReassemblyError::Incomplete {
                missing,
                count: max.saturating_add(1),
            });
        }
        Ok(joined)
    }

    /// SHA-256 hex over the payloads in part order.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for part in &self.parts {
            hasher.update(part.payload.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Record chunk 0's transaction id and point every other chunk at it.
    pub fn link_to_first(&mut self, txid: &str) {
        for part in &mut self.parts {
            if part.is_first_part() {
                part.transport_id = Some(txid.to_string());
            } else {
                part.first_part_reference = Some(txid.to_string());
            }
        }
    }

    /// True once every chunk has a transaction id.
    pub fn is_fully_anchored(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|p| p.transport_id.is_some())
    }

    /// Transaction ids of the anchored chunks, in part order.
    pub fn transport_ids(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|p| p.transport_id.as_deref())
            .collect()
    }

    /// Wire form of every chunk, in part order.
    pub fn to_wire_lines(&self) -> Vec<String> {
        self.parts.iter().map(Multipart::to_wire).collect()
    }
}
