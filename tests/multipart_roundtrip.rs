//! Fragmenting records into chunks and rebuilding them.

mod fixtures;

use fixtures::long_record;
use oip_record::multipart::{group_by_first_part, reassemble, reassemble_all, CHOP_MAX_LEN};
use oip_record::{Artifact, ChunkSet, ErrorCode, Multipart, MultipartCodec, ReassemblyError, Transport};

fn anchored_chunks(serialized: &str, first_txid: &str) -> Vec<Multipart> {
    let Transport::Multipart { mut chunks, .. } = MultipartCodec::fragment(serialized, "FAddr")
    else {
        panic!("expected a multipart transport");
    };
    chunks.link_to_first(first_txid);
    chunks
        .parts()
        .iter()
        .map(|part| {
            let txid = if part.is_first_part() {
                first_txid.to_string()
            } else {
                format!("{}{:02}", &first_txid[..first_txid.len() - 2], part.part_number)
            };
            Multipart::parse_anchored(&part.to_wire(), txid).unwrap()
        })
        .collect()
}

// =============================================================================
// Fragmenting
// =============================================================================

#[test]
fn test_chunks_respect_payload_limit() {
    let canonical = long_record(5000).to_canonical_form().unwrap();
    let transport = MultipartCodec::fragment(&canonical, "FAddr");
    let chunks = transport.chunks().unwrap();

    assert_eq!(chunks.len(), canonical.len().div_ceil(CHOP_MAX_LEN));
    for part in chunks.parts() {
        assert!(part.payload.len() <= CHOP_MAX_LEN);
        assert_eq!(part.total_parts as usize, chunks.len() - 1);
    }
    assert!(chunks.first().unwrap().has_generation_prefix);
    assert_eq!(chunks.reassemble_string().unwrap(), canonical);
}

#[test]
fn test_wire_lines_parse_back() {
    let canonical = long_record(3000).to_canonical_form().unwrap();
    let transport = MultipartCodec::fragment(&canonical, "FAddr");
    let lines = transport.chunks().unwrap().to_wire_lines();

    let parsed: Vec<Multipart> = lines.iter().map(|l| Multipart::parse(l).unwrap()).collect();
    let artifact = Artifact::from_chunk_list(&ChunkSet::new(parsed)).unwrap();
    assert_eq!(artifact.title(), "Long Record");
    assert_eq!(artifact.to_canonical_form().unwrap(), canonical);
}

// =============================================================================
// Reassembling
// =============================================================================

#[test]
fn test_shuffled_chunks_reassemble() {
    let canonical = long_record(4000).to_canonical_form().unwrap();
    let first = "ab".repeat(32);
    let mut parts = anchored_chunks(&canonical, &first);
    parts.reverse();

    let artifact = reassemble(&parts, &first).unwrap();
    assert_eq!(artifact.txid(), Some(first.as_str()));
    assert_eq!(artifact.to_canonical_form().unwrap(), canonical);
}

#[test]
fn test_short_reference_matches() {
    let canonical = long_record(2000).to_canonical_form().unwrap();
    let first = "cd".repeat(32);
    let parts = anchored_chunks(&canonical, &first);

    let artifact = reassemble(&parts, &first[..10]).unwrap();
    assert_eq!(artifact.txid(), Some(first.as_str()));
}

#[test]
fn test_interleaved_records_are_kept_apart() {
    let one = long_record(2000).to_canonical_form().unwrap();
    let mut other = long_record(3000);
    other.set_title("Other Record");
    let two = other.to_canonical_form().unwrap();

    let first_one = "11".repeat(32);
    let first_two = "22".repeat(32);
    let mut parts = anchored_chunks(&one, &first_one);
    parts.extend(anchored_chunks(&two, &first_two));

    assert_eq!(group_by_first_part(&parts).len(), 2);
    assert_eq!(reassemble(&parts, &first_two).unwrap().title(), "Other Record");

    let all = reassemble_all(&parts);
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|(_, result)| result.is_ok()));
}

#[test]
fn test_missing_chunk_reports_gap() {
    let canonical = long_record(4000).to_canonical_form().unwrap();
    let first = "ef".repeat(32);
    let mut parts = anchored_chunks(&canonical, &first);
    parts.remove(2);

    let err = reassemble(&parts, &first).unwrap_err();
    match &err {
        ReassemblyError::Incomplete { missing, .. } => assert_eq!(*missing, vec![2]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.code(), ErrorCode::IncompleteMultipart);
}

#[test]
fn test_chunks_cut_by_character_count_reassemble() {
    let mut record = long_record(0);
    record.set_description("é".repeat(2000));
    let canonical = record.to_canonical_form().unwrap();

    let chars: Vec<char> = canonical.chars().collect();
    let slices: Vec<String> = chars
        .chunks(CHOP_MAX_LEN)
        .map(|slice| slice.iter().collect())
        .collect();
    assert!(slices.iter().any(|slice| slice.len() > CHOP_MAX_LEN));

    let first = "aa".repeat(32);
    let max = (slices.len() - 1) as u32;
    let parts: Vec<Multipart> = slices
        .iter()
        .enumerate()
        .map(|(i, payload)| {
            let mut part = Multipart::new(i as u32, max, "FAddr", payload.as_str());
            if i == 0 {
                part.transport_id = Some(first.clone());
            } else {
                part.first_part_reference = Some(first.clone());
                part.transport_id = Some(format!("{}{:02}", &first[..62], i));
            }
            part
        })
        .collect();

    let artifact = reassemble(&parts, &first).unwrap();
    assert_eq!(artifact.description(), "é".repeat(2000));
    assert_eq!(artifact.to_canonical_form().unwrap(), canonical);
}

#[test]
fn test_unknown_reference() {
    let canonical = long_record(2000).to_canonical_form().unwrap();
    let parts = anchored_chunks(&canonical, &"0a".repeat(32));
    assert!(matches!(
        reassemble(&parts, "ffff"),
        Err(ReassemblyError::NoMatchingGroup(_))
    ));
}

#[test]
fn test_chunks_of_a_non_record() {
    let junk = format!("{{\"nothing\":\"{}\"}}", "z".repeat(2000));
    let first = "99".repeat(32);
    let parts = anchored_chunks(&junk, &first);

    let err = reassemble(&parts, &first).unwrap_err();
    assert!(matches!(err, ReassemblyError::Decode(_)));
    assert_eq!(err.code(), ErrorCode::MalformedInput);
}
