//! Decoding of the three historical record generations.
//!
//! A raw record is first classified into a [`RawRecord`] variant, then
//! handed to the importer for that generation. Importers never sniff shapes:
//! once the generation is known, each field is read in the one shape that
//! generation uses.
//!
//! Accepted layouts:
//!
//! ```text
//! {"media-data": {"alexandria-media": {...}}}
//! {"oip-041": {"signature": "...", "artifact": {...}}}
//! {"oip042": {"signature": "...", "artifact": {...}}}
//! {"oip042": {"publish": {"artifact": {...}}}}
//! {"artifact": {...}, "meta": {"type": "oip041", "txid": "...", ...}}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use super::file::ArtifactFile;
use super::model::{Artifact, DecodeState};
use super::payment::Scale;
use crate::error::{DecodeError, ReassemblyError};
use crate::multipart::{self, ChunkSet};
use oip_wire::{GENERATION_ALEXANDRIA, GENERATION_OIP041, GENERATION_OIP042};

type Object = Map<String, Value>;

/// Schema generation a record was written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    AlexandriaMedia,
    Oip041,
    Oip042,
}

impl Generation {
    pub fn tag(&self) -> &'static str {
        match self {
            Generation::AlexandriaMedia => GENERATION_ALEXANDRIA,
            Generation::Oip041 => GENERATION_OIP041,
            Generation::Oip042 => GENERATION_OIP042,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            GENERATION_ALEXANDRIA => Some(Generation::AlexandriaMedia),
            GENERATION_OIP041 => Some(Generation::Oip041),
            GENERATION_OIP042 => Some(Generation::Oip042),
            _ => None,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Whether a decode starts from a blank record or layers onto the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Start from an empty record; nothing from the previous state survives.
    #[default]
    Replace,
    /// Layer the decoded fields over the current state. Lists are appended.
    Merge,
}

/// A raw record body tagged with its generation.
#[derive(Debug, Clone, Copy)]
pub enum RawRecord<'a> {
    AlexandriaMedia(&'a Object),
    Oip041(&'a Object),
    Oip042(&'a Object),
}

impl RawRecord<'_> {
    pub fn generation(&self) -> Generation {
        match self {
            RawRecord::AlexandriaMedia(_) => Generation::AlexandriaMedia,
            RawRecord::Oip041(_) => Generation::Oip041,
            RawRecord::Oip042(_) => Generation::Oip042,
        }
    }
}

/// Result of classifying a raw root object.
struct Classified<'a> {
    record: RawRecord<'a>,
    signature: Option<&'a str>,
    meta: Option<&'a Object>,
}

fn classify(root: &Object) -> Result<Classified<'_>, DecodeError> {
    if let Some(meta) = root.get("meta").and_then(Value::as_object) {
        if let Some(tag) = meta.get("type").and_then(Value::as_str) {
            let generation = Generation::from_tag(tag)
                .ok_or_else(|| DecodeError::UnsupportedGeneration(tag.to_string()))?;
            let body = object_at(root, "artifact")?;
            return Ok(Classified {
                record: tagged(generation, body),
                signature: None,
                meta: Some(meta),
            });
        }
        debug!("meta carries no generation tag, probing wrapper keys");
    }

    if let Some(media) = root.get("media-data") {
        let media = media
            .as_object()
            .ok_or_else(|| DecodeError::MissingStructure("media-data".into()))?;
        let body = object_at(media, GENERATION_ALEXANDRIA)?;
        return Ok(Classified {
            record: RawRecord::AlexandriaMedia(body),
            signature: non_empty_str(media, "signature"),
            meta: None,
        });
    }

    if let Some(wrapper) = root.get("oip-041") {
        let wrapper = wrapper
            .as_object()
            .ok_or_else(|| DecodeError::MissingStructure("oip-041".into()))?;
        return Ok(Classified {
            record: RawRecord::Oip041(object_at(wrapper, "artifact")?),
            signature: non_empty_str(wrapper, "signature"),
            meta: None,
        });
    }

    if let Some(wrapper) = root.get(GENERATION_OIP042) {
        let wrapper = wrapper
            .as_object()
            .ok_or_else(|| DecodeError::MissingStructure(GENERATION_OIP042.into()))?;
        let body = match wrapper.get("artifact").and_then(Value::as_object) {
            Some(body) => body,
            None => wrapper
                .get("publish")
                .and_then(|p| p.get("artifact"))
                .and_then(Value::as_object)
                .ok_or_else(|| DecodeError::MissingStructure("oip042.artifact".into()))?,
        };
        return Ok(Classified {
            record: RawRecord::Oip042(body),
            signature: non_empty_str(wrapper, "signature"),
            meta: None,
        });
    }

    Err(DecodeError::MissingStructure(
        "no recognized generation wrapper".into(),
    ))
}

fn tagged(generation: Generation, body: &Object) -> RawRecord<'_> {
    match generation {
        Generation::AlexandriaMedia => RawRecord::AlexandriaMedia(body),
        Generation::Oip041 => RawRecord::Oip041(body),
        Generation::Oip042 => RawRecord::Oip042(body),
    }
}

fn object_at<'a>(parent: &'a Object, key: &str) -> Result<&'a Object, DecodeError> {
    parent
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| DecodeError::MissingStructure(key.to_string()))
}

impl Artifact {
    /// Decode a serialized record, with or without the `json:` marker.
    pub fn from_serialized_string(data: &str) -> Result<Self, DecodeError> {
        let raw: Value = serde_json::from_str(oip_wire::strip_json_prefix(data))?;
        Self::from_raw_object(&raw)
    }

    /// Decode an already-parsed record of any supported generation.
    pub fn from_raw_object(raw: &Value) -> Result<Self, DecodeError> {
        let mut artifact = Artifact::new();
        artifact.decode_into(raw, DecodeMode::Replace)?;
        Ok(artifact)
    }

    /// Reassemble a complete chunk set and decode the record it carries.
    pub fn from_chunk_list(chunks: &ChunkSet) -> Result<Self, ReassemblyError> {
        multipart::decode_chunk_set(chunks)
    }

    /// Decode `raw` into this instance.
    ///
    /// The work happens on a staging copy; on error `self` is untouched.
    pub fn decode_into(&mut self, raw: &Value, mode: DecodeMode) -> Result<(), DecodeError> {
        let root = raw.as_object().ok_or(DecodeError::NotAnObject)?;
        let classified = classify(root)?;

        let mut staging = match mode {
            DecodeMode::Replace => Artifact::new(),
            DecodeMode::Merge => self.clone(),
        };
        staging.decode_state = DecodeState::Importing;

        match classified.record {
            RawRecord::AlexandriaMedia(body) => import_alexandria(&mut staging, body)?,
            RawRecord::Oip041(body) => import_oip041(&mut staging, body)?,
            RawRecord::Oip042(body) => import_oip042(&mut staging, body)?,
        }
        if let Some(signature) = classified.signature {
            staging.set_signature(signature);
        }
        staging.meta.generation = Some(classified.record.generation());
        if let Some(meta) = classified.meta {
            apply_meta(&mut staging, meta);
        }

        staging.decode_state = if staging.is_valid() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
        debug!(
            generation = %classified.record.generation(),
            state = ?staging.decode_state,
            files = staging.files.len(),
            "decoded record"
        );
        *self = staging;
        Ok(())
    }
}

fn apply_meta(artifact: &mut Artifact, meta: &Object) {
    if let Some(block) = meta.get("block").and_then(Value::as_u64) {
        artifact.meta.block = Some(block);
    }
    if let Some(hash) = non_empty_str(meta, "block_hash") {
        artifact.meta.block_hash = Some(hash.to_string());
    }
    if let Some(txid) = non_empty_str(meta, "txid") {
        artifact.meta.txid = Some(txid.to_string());
    }
    if let Some(time) = meta.get("time").and_then(Value::as_i64) {
        artifact.meta.time = Some(time);
    }
    if let Some(signature) = non_empty_str(meta, "signature") {
        artifact.set_signature(signature);
    }
    artifact.meta.deactivated = meta
        .get("deactivated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
}

// -- alexandria-media -------------------------------------------------------

fn import_alexandria(artifact: &mut Artifact, body: &Object) -> Result<(), DecodeError> {
    if let Some(publisher) = non_empty_str(body, "publisher") {
        artifact.set_address(publisher);
    }
    if let Some(ts) = integer(body.get("timestamp")) {
        artifact.set_timestamp(ts);
    }
    if let Some(raw_type) = non_empty_str(body, "type") {
        let mapped = match raw_type {
            "music" => "Audio",
            "book" => {
                artifact.set_subtype("Book");
                "Text"
            }
            "thing" => "Web",
            other => other,
        };
        if let Err(err) = artifact.set_type(mapped) {
            debug!(%err, "ignoring legacy type");
        }
    }
    if let Some(torrent) = non_empty_str(body, "torrent") {
        artifact.set_location(torrent);
        if torrent.split(':').next() == Some("btih") {
            artifact.set_network("bittorrent");
        }
    }

    let Some(info) = body.get("info").and_then(Value::as_object) else {
        return Ok(());
    };
    read_basic_info(artifact, info);

    let extra = info
        .get("extra-info")
        .or_else(|| info.get("extraInfo"))
        .and_then(Value::as_object);
    let Some(extra) = extra else {
        return Ok(());
    };

    let mut inferred = Vec::new();
    let mut had_files = false;
    for (key, value) in extra {
        match key.as_str() {
            "tags" => set_tags_value(artifact, value),
            "Bitcoin Address" => {
                if let Some(address) = value.as_str() {
                    artifact.add_payment_address("btc", address);
                }
            }
            "DHT Hash" => {
                if let Some(hash) = value.as_str() {
                    artifact.set_location(hash);
                }
            }
            "filename" => {
                if let Some(name) = value.as_str().filter(|n| *n != "none" && !n.is_empty()) {
                    inferred.push(ArtifactFile::named(name));
                }
            }
            "posterFrame" => {
                if let Some(name) = value.as_str().filter(|n| !n.is_empty()) {
                    inferred.push(ArtifactFile::named(name).with_type("Image", Some("Thumbnail")));
                }
            }
            "runtime" => artifact.set_detail("duration", value.clone()),
            "files" => {
                let entries = value.as_array().ok_or(DecodeError::MalformedField {
                    field: "extra-info.files",
                    expected: "array",
                })?;
                let before = artifact.files.len();
                artifact.files.extend(entries.iter().filter_map(ArtifactFile::from_value));
                had_files |= artifact.files.len() > before;
            }
            _ => artifact.set_detail(key.clone(), value.clone()),
        }
    }
    if !had_files {
        artifact.files.extend(inferred);
    }
    Ok(())
}

// -- oip041 -----------------------------------------------------------------

#[derive(Deserialize)]
struct TokenAddress {
    token: String,
    address: String,
}

fn import_oip041(artifact: &mut Artifact, body: &Object) -> Result<(), DecodeError> {
    if let Some(publisher) = non_empty_str(body, "publisher") {
        artifact.set_address(publisher);
    }
    if let Some(ts) = integer(body.get("timestamp")) {
        artifact.set_timestamp(ts);
    }
    if let Some(joined) = non_empty_str(body, "type") {
        let (main, sub) = match joined.split_once('-') {
            Some((main, sub)) => (main, Some(sub)),
            None => (joined, None),
        };
        if let Err(err) = artifact.set_type(main) {
            debug!(%err, "ignoring oip041 type");
        }
        if let Some(sub) = sub.filter(|s| !s.is_empty()) {
            artifact.set_subtype(sub);
        }
    }
    if let Some(info) = body.get("info").and_then(Value::as_object) {
        read_basic_info(artifact, info);
        read_info_flags(artifact, info);
        if let Some(extra) = info.get("extraInfo").and_then(Value::as_object) {
            for (key, value) in extra {
                artifact.set_detail(key.clone(), value.clone());
            }
        }
    }
    read_storage(artifact, body)?;

    if let Some(payment) = body.get("payment").and_then(Value::as_object) {
        read_payment_terms(artifact, payment);
        if let Some(addresses) = payment.get("addresses").filter(|v| !v.is_null()) {
            let entries: Vec<TokenAddress> = serde_json::from_value(addresses.clone())
                .map_err(|_| DecodeError::MalformedField {
                    field: "payment.addresses",
                    expected: "array of {token, address}",
                })?;
            for entry in entries {
                artifact.add_payment_address(&entry.token, entry.address);
            }
        }
    }
    Ok(())
}

// -- oip042 -----------------------------------------------------------------

fn import_oip042(artifact: &mut Artifact, body: &Object) -> Result<(), DecodeError> {
    if let Some(address) = non_empty_str(body, "floAddress") {
        artifact.set_address(address);
    }
    if let Some(ts) = integer(body.get("timestamp")) {
        artifact.set_timestamp(ts);
    }
    if let Some(raw_type) = non_empty_str(body, "type") {
        if let Err(err) = artifact.set_type(raw_type) {
            debug!(%err, "ignoring oip042 type");
        }
    }
    if let Some(subtype) = non_empty_str(body, "subtype") {
        artifact.set_subtype(subtype);
    }
    if let Some(signature) = non_empty_str(body, "signature") {
        artifact.set_signature(signature);
    }
    if let Some(info) = body.get("info").and_then(Value::as_object) {
        read_basic_info(artifact, info);
        read_info_flags(artifact, info);
    }
    if let Some(details) = body.get("details").and_then(Value::as_object) {
        for (key, value) in details {
            artifact.set_detail(key.clone(), value.clone());
        }
    }
    read_storage(artifact, body)?;

    if let Some(payment) = body.get("payment").and_then(Value::as_object) {
        read_payment_terms(artifact, payment);
        if let Some(addresses) = payment.get("addresses").filter(|v| !v.is_null()) {
            let map: BTreeMap<String, String> = serde_json::from_value(addresses.clone())
                .map_err(|_| DecodeError::MalformedField {
                    field: "payment.addresses",
                    expected: "object of coin to address",
                })?;
            for (coin, address) in map {
                artifact.add_payment_address(&coin, address);
            }
        }
    }
    Ok(())
}

// -- shared readers ---------------------------------------------------------

fn read_basic_info(artifact: &mut Artifact, info: &Object) {
    if let Some(title) = non_empty_str(info, "title") {
        artifact.set_title(title);
    }
    if let Some(description) = non_empty_str(info, "description") {
        artifact.set_description(description);
    }
    if let Some(year) = integer(info.get("year")) {
        artifact.set_year(year);
    }
}

fn read_info_flags(artifact: &mut Artifact, info: &Object) {
    if let Some(tags) = info.get("tags") {
        set_tags_value(artifact, tags);
    }
    if info.get("nsfw").and_then(Value::as_bool) == Some(true) {
        artifact.set_nsfw(true);
    }
}

fn read_storage(artifact: &mut Artifact, body: &Object) -> Result<(), DecodeError> {
    let Some(storage) = body.get("storage").and_then(Value::as_object) else {
        return Ok(());
    };
    if let Some(network) = non_empty_str(storage, "network") {
        artifact.set_network(network);
    }
    if let Some(location) = non_empty_str(storage, "location") {
        artifact.set_location(location);
    }
    match storage.get("files") {
        None | Some(Value::Null) => {}
        Some(Value::Array(entries)) => {
            artifact
                .files
                .extend(entries.iter().filter_map(ArtifactFile::from_value));
        }
        Some(_) => {
            return Err(DecodeError::MalformedField {
                field: "storage.files",
                expected: "array",
            })
        }
    }
    Ok(())
}

fn read_payment_terms(artifact: &mut Artifact, payment: &Object) {
    if let Some(fiat) = non_empty_str(payment, "fiat") {
        artifact.set_payment_fiat(fiat);
    }
    if let Some(scale) = payment.get("scale").and_then(Scale::from_value) {
        artifact.set_payment_scale(scale);
    }
    let tips = payment
        .get("sugTip")
        .or_else(|| payment.get("tips"))
        .and_then(Value::as_array);
    if let Some(tips) = tips {
        let tips: Vec<f64> = tips.iter().filter_map(|t| float(Some(t))).collect();
        if !tips.is_empty() {
            artifact.set_suggested_tips(tips);
        }
    }
    if let Some(cut) = float(payment.get("retailer")) {
        artifact.set_retailer_cut(cut);
    }
    if let Some(cut) = float(payment.get("promoter")) {
        artifact.set_promoter_cut(cut);
    }
    if let Some(max) = float(payment.get("maxdisc")) {
        artifact.set_max_discount(max);
    }
    if let Some(rules) = payment.get("tokens").and_then(Value::as_array) {
        for rule in rules {
            artifact.add_token_rule(rule.clone());
        }
    }
}

fn set_tags_value(artifact: &mut Artifact, value: &Value) {
    match value {
        Value::Array(items) => artifact.set_tags(items.iter().filter_map(Value::as_str)),
        Value::String(joined) => artifact.set_tags_from_str(joined),
        _ => {}
    }
}

fn non_empty_str<'a>(map: &'a Object, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
