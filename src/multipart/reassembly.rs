//! Grouping loose chunks and rebuilding records from them.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::chunk_set::ChunkSet;
use crate::artifact::Artifact;
use crate::error::ReassemblyError;
use oip_wire::{strip_json_prefix, Multipart};

/// Group chunks by the transaction id of their chunk 0.
///
/// Chunks that fail framing checks or have no group key yet are dropped.
pub fn group_by_first_part(candidates: &[Multipart]) -> BTreeMap<String, Vec<Multipart>> {
    let mut groups: BTreeMap<String, Vec<Multipart>> = BTreeMap::new();
    for candidate in candidates {
        if let Err(err) = candidate.validate_received() {
            debug!(part = candidate.part_number, %err, "skipping chunk");
            continue;
        }
        let Some(key) = candidate.group_key() else {
            debug!(part = candidate.part_number, "skipping unlinked chunk");
            continue;
        };
        groups
            .entry(key.to_string())
            .or_default()
            .push(candidate.clone());
    }
    groups
}

/// Shortest-prefix match between a queried id and a first-part reference.
///
/// Both ids are cut to the shorter length and compared case-insensitively,
/// so a shortened id still finds its set.
pub fn matches_reference(query: &str, reference: &str) -> bool {
    let shared = query.len().min(reference.len());
    if shared == 0 || !query.is_char_boundary(shared) || !reference.is_char_boundary(shared) {
        return false;
    }
    query[..shared].eq_ignore_ascii_case(&reference[..shared])
}

/// Rebuild the record whose chunk 0 is `first_txid` from `candidates`.
///
/// `candidates` may be in any order and mixed with chunks of other records.
pub fn reassemble(candidates: &[Multipart], first_txid: &str) -> Result<Artifact, ReassemblyError> {
    let groups = group_by_first_part(candidates);
    let matching: Vec<&String> = groups
        .keys()
        .filter(|key| matches_reference(first_txid, key))
        .collect();

    let key = match matching.as_slice() {
        [] => return Err(ReassemblyError::NoMatchingGroup(first_txid.to_string())),
        [only] => *only,
        several => match several.iter().find(|k| k.eq_ignore_ascii_case(first_txid)) {
            Some(exact) => *exact,
            None => {
                return Err(ReassemblyError::AmbiguousReference {
                    reference: first_txid.to_string(),
                    groups: several.len(),
                })
            }
        },
    };

    let parts = groups.get(key).cloned().unwrap_or_default();
    decode_chunk_set(&ChunkSet::new(parts))
}

/// Rebuild every group found in `candidates`, one result per group.
pub fn reassemble_all(candidates: &[Multipart]) -> Vec<(String, Result<Artifact, ReassemblyError>)> {
    group_by_first_part(candidates)
        .into_iter()
        .map(|(key, parts)| {
            let result = decode_chunk_set(&ChunkSet::new(parts));
            (key, result)
        })
        .collect()
}

pub(crate) fn decode_chunk_set(set: &ChunkSet) -> Result<Artifact, ReassemblyError> {
    let serialized = set.reassemble_string()?;
    let raw: Value = serde_json::from_str(strip_json_prefix(&serialized))
        .map_err(|e| ReassemblyError::Corrupt(e.to_string()))?;
    let mut artifact = Artifact::from_raw_object(&raw)?;

    if let Some(txid) = set.first().and_then(|p| p.transport_id.as_deref()) {
        if artifact.txid() != Some(txid) {
            artifact.set_txid(txid);
        }
    }
    artifact.store_chunk_set(Some(set.clone()));
    debug!(
        parts = set.len(),
        bytes = serialized.len(),
        txid = artifact.txid().unwrap_or(""),
        "reassembled record"
    );
    Ok(artifact)
}
