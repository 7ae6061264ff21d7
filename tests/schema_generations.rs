//! Decoding every schema generation into the canonical form.

mod fixtures;

use fixtures::{ALEXANDRIA_MOVIE, OIP041_IMAGE, OIP042_RESEARCH};
use oip_record::artifact::DecodeState;
use oip_record::{Artifact, ArtifactType, DecodeError, DecodeMode, ErrorCode, Generation};
use serde_json::{json, Value};

// =============================================================================
// alexandria-media
// =============================================================================

#[test]
fn test_alexandria_record_decodes() {
    let artifact = Artifact::from_serialized_string(ALEXANDRIA_MOVIE).unwrap();

    assert_eq!(artifact.generation(), Some(Generation::AlexandriaMedia));
    assert_eq!(artifact.artifact_type(), Some(ArtifactType::Video));
    assert_eq!(artifact.title(), "Hackers (1995)");
    assert_eq!(artifact.year(), Some(1995));
    assert_eq!(artifact.address(), "FLmic78oU6eqXsTAaHGGdrFyY7FK3sQW6S");
    assert_eq!(artifact.timestamp(), Some(1445624467));
    assert_eq!(artifact.network(), "IPFS");
    assert_eq!(
        artifact.location(),
        Some("QmRA3NWM82ZGynMbYzAgYTSXCVM14Wx1RZ8fKP42G6gjgj")
    );
    assert_eq!(artifact.tags(), ["hackers", "1995", "cult"]);
    assert_eq!(artifact.detail("director"), Some(&json!("Iain Softley")));
    assert_eq!(artifact.duration(), Some(6300.0));
    assert_eq!(
        artifact.payment_address("BTC").as_deref(),
        Some("1AMeQuq5M5Um1VZcCBGHvLhkNiNQYwrNxs")
    );
    assert!(artifact.signature().is_some());
    assert_eq!(artifact.decode_state(), DecodeState::Valid);
}

#[test]
fn test_alexandria_files_are_inferred() {
    let artifact = Artifact::from_serialized_string(ALEXANDRIA_MOVIE).unwrap();

    let names: Vec<_> = artifact
        .files()
        .iter()
        .filter_map(|f| f.fname.as_deref())
        .collect();
    assert_eq!(names, ["Hackers.mp4", "poster.jpg"]);
    assert_eq!(
        artifact.thumbnail().and_then(|f| f.fname.as_deref()),
        Some("poster.jpg")
    );
}

// =============================================================================
// oip-041
// =============================================================================

#[test]
fn test_oip041_record_with_meta() {
    let artifact = Artifact::from_serialized_string(OIP041_IMAGE).unwrap();

    assert_eq!(artifact.generation(), Some(Generation::Oip041));
    assert_eq!(artifact.artifact_type(), Some(ArtifactType::Image));
    assert_eq!(artifact.subtype(), Some("Basic"));
    assert_eq!(artifact.title(), "Headshot");
    assert_eq!(artifact.meta().block, Some(2832215));
    assert_eq!(artifact.meta().time, Some(1531065167));
    assert_eq!(
        artifact.txid(),
        Some("5f399eef8f93c03502efbd51691350cbacbf3c16eba228409bf7453ffff78207")
    );
    assert_eq!(artifact.payment_scale(), 1000);
    assert_eq!(artifact.payment().fiat.as_deref(), Some("USD"));
    assert_eq!(artifact.supported_coins(), ["btc"]);
    assert!(artifact.is_paid());
    assert_eq!(artifact.files()[0].fsize, Some(100677));
}

#[test]
fn test_oip041_wrapper_without_meta() {
    let raw: Value = serde_json::from_str(OIP041_IMAGE).unwrap();
    let wrapped = json!({"oip-041": {"signature": "c2ln", "artifact": raw["artifact"]}});

    let artifact = Artifact::from_raw_object(&wrapped).unwrap();
    assert_eq!(artifact.generation(), Some(Generation::Oip041));
    assert_eq!(artifact.signature(), Some("c2ln"));
    assert_eq!(artifact.txid(), None);
}

// =============================================================================
// oip042
// =============================================================================

#[test]
fn test_oip042_record_decodes() {
    let artifact = Artifact::from_serialized_string(OIP042_RESEARCH).unwrap();

    assert_eq!(artifact.generation(), Some(Generation::Oip042));
    assert_eq!(artifact.artifact_type(), Some(ArtifactType::Research));
    assert_eq!(artifact.subtype(), Some("Tomogram"));
    assert_eq!(artifact.tags(), ["etdb", "jensen.lab", "tomogram"]);
    assert_eq!(artifact.detail("NBCItaxID"), Some(&json!(959)));
    assert_eq!(artifact.payment_addresses().len(), 1);
    assert!(!artifact.is_paid());
}

#[test]
fn test_loosely_typed_file_entries_are_kept() {
    let raw = json!({"oip042": {"artifact": {
        "floAddress": "FAddr",
        "info": {"title": "Two files"},
        "storage": {"network": "IPFS", "files": [
            {"fname": "a.mp4", "disBuy": "true"},
            {"fname": "b.mp4", "disPlay": false, "dname": 7}
        ]}
    }}});
    let artifact = Artifact::from_raw_object(&raw).unwrap();

    assert_eq!(artifact.files().len(), 2);
    assert_eq!(artifact.files()[0].disallow_buy, Some(true));
    assert_eq!(artifact.files()[1].extra.get("dname"), Some(&json!(7)));

    let reread = Artifact::from_serialized_string(&artifact.to_canonical_form().unwrap()).unwrap();
    assert_eq!(reread.files(), artifact.files());
}

#[test]
fn test_token_rules_survive_reencoding() {
    let rule = json!({"token": "ALX", "amount": 5, "type": "hold"});
    let raw = json!({"oip042": {"artifact": {
        "floAddress": "FAddr",
        "info": {"title": "Gated"},
        "payment": {"fiat": "USD", "tokens": [rule]}
    }}});
    let artifact = Artifact::from_raw_object(&raw).unwrap();
    assert_eq!(artifact.token_rules(), [rule.clone()]);

    let canonical = artifact.to_canonical_form().unwrap();
    let value: Value = serde_json::from_str(&canonical).unwrap();
    assert_eq!(value["oip042"]["artifact"]["payment"]["tokens"], json!([rule]));
}

#[test]
fn test_json_marker_is_accepted() {
    let marked = format!("json:{}", OIP042_RESEARCH);
    let plain = Artifact::from_serialized_string(OIP042_RESEARCH).unwrap();
    let prefixed = Artifact::from_serialized_string(&marked).unwrap();
    assert_eq!(plain, prefixed);
}

// =============================================================================
// Canonical form
// =============================================================================

#[test]
fn test_every_generation_reencodes_as_oip042() {
    for fixture in [ALEXANDRIA_MOVIE, OIP041_IMAGE, OIP042_RESEARCH] {
        let artifact = Artifact::from_serialized_string(fixture).unwrap();
        let canonical = artifact.to_canonical_form().unwrap();
        assert!(canonical.starts_with("{\"oip042\":{\"artifact\":{"));

        let reread = Artifact::from_serialized_string(&canonical).unwrap();
        assert_eq!(reread.generation(), Some(Generation::Oip042));
        assert_eq!(reread.title(), artifact.title());
        assert_eq!(reread.artifact_type(), artifact.artifact_type());
        assert_eq!(reread.files(), artifact.files());
        assert_eq!(reread.details(), artifact.details());
        assert_eq!(reread.to_canonical_form().unwrap(), canonical);
    }
}

#[test]
fn test_canonical_form_is_key_order_independent() {
    let a = json!({"oip042": {"artifact": {
        "floAddress": "FAddr", "info": {"title": "T", "description": "D"}
    }}});
    let b = json!({"oip042": {"artifact": {
        "info": {"description": "D", "title": "T"}, "floAddress": "FAddr"
    }}});
    let a = Artifact::from_raw_object(&a).unwrap();
    let b = Artifact::from_raw_object(&b).unwrap();
    assert_eq!(a.to_canonical_form().unwrap(), b.to_canonical_form().unwrap());
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
}

#[test]
fn test_indexed_value_carries_meta() {
    let artifact = Artifact::from_serialized_string(OIP041_IMAGE).unwrap();
    let indexed = artifact.to_indexed_value();

    assert_eq!(indexed["meta"]["type"], "oip042");
    assert_eq!(indexed["meta"]["block"], 2832215);
    let reread = Artifact::from_raw_object(&indexed).unwrap();
    assert_eq!(reread.txid(), artifact.txid());
    assert_eq!(reread.title(), "Headshot");
}

// =============================================================================
// Rejections
// =============================================================================

#[test]
fn test_rejections_carry_codes() {
    let cases: [(&str, ErrorCode); 4] = [
        ("not json", ErrorCode::MalformedInput),
        ("[1, 2]", ErrorCode::MalformedInput),
        ("{\"unknown\": {}}", ErrorCode::MalformedInput),
        (
            "{\"artifact\": {}, \"meta\": {\"type\": \"oip099\"}}",
            ErrorCode::UnsupportedGeneration,
        ),
    ];
    for (input, code) in cases {
        let err = Artifact::from_serialized_string(input).unwrap_err();
        assert_eq!(err.code(), code, "input: {}", input);
    }
}

#[test]
fn test_failed_decode_keeps_previous_state() {
    let mut artifact = Artifact::from_serialized_string(OIP042_RESEARCH).unwrap();
    let before = artifact.clone();

    let bad = json!({"oip-041": {"artifact": {"payment": {"addresses": {"btc": "x"}}}}});
    let err = artifact.decode_into(&bad, DecodeMode::Merge).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedField { .. }));
    assert_eq!(artifact, before);
}

#[test]
fn test_merge_keeps_unset_fields() {
    let mut artifact = Artifact::from_serialized_string(OIP042_RESEARCH).unwrap();
    artifact
        .decode_into(
            &json!({"oip042": {"artifact": {"info": {"title": "Renamed"}}}}),
            DecodeMode::Merge,
        )
        .unwrap();
    assert_eq!(artifact.title(), "Renamed");
    assert_eq!(artifact.subtype(), Some("Tomogram"));

    artifact
        .decode_into(
            &json!({"oip042": {"artifact": {"info": {"title": "Fresh"}}}}),
            DecodeMode::Replace,
        )
        .unwrap();
    assert_eq!(artifact.subtype(), None);
    assert_eq!(artifact.decode_state(), DecodeState::Invalid);
}
