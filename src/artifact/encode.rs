//! Canonical current-generation encoding.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::model::Artifact;
use crate::error::EncodeError;
use oip_wire::GENERATION_OIP042;

impl Artifact {
    /// Serialize to the current-generation wrapper
    /// `{"oip042":{"artifact":{...}}}` with RFC 8785 key ordering.
    ///
    /// Files are re-derived from the live list on every call.
    pub fn to_canonical_form(&self) -> Result<String, EncodeError> {
        let wrapped = json!({ GENERATION_OIP042: { "artifact": self.record_value() } });
        serde_json_canonicalizer::to_string(&wrapped)
            .map_err(|e| EncodeError::Canonicalization(e.to_string()))
    }

    /// Index listing shape: the record plus its provenance meta.
    ///
    /// Decodable again with [`Artifact::from_raw_object`].
    pub fn to_indexed_value(&self) -> Value {
        let meta = &self.meta;
        let mut map = Map::new();
        if let Some(block) = meta.block {
            map.insert("block".into(), Value::from(block));
        }
        if let Some(hash) = &meta.block_hash {
            map.insert("block_hash".into(), Value::from(hash.as_str()));
        }
        if let Some(txid) = &meta.txid {
            map.insert("txid".into(), Value::from(txid.as_str()));
        }
        if let Some(time) = meta.time {
            map.insert("time".into(), Value::from(time));
        }
        if let Some(signature) = &meta.signature {
            map.insert("signature".into(), Value::from(signature.as_str()));
        }
        map.insert("deactivated".into(), Value::Bool(meta.deactivated));
        map.insert("type".into(), Value::from(GENERATION_OIP042));

        json!({ "artifact": self.record_value(), "meta": Value::Object(map) })
    }

    /// SHA-256 hex of the canonical form.
    pub fn fingerprint(&self) -> Result<String, EncodeError> {
        let canonical = self.to_canonical_form()?;
        Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    fn record_value(&self) -> Value {
        let mut record = Map::new();
        if !self.address.is_empty() {
            record.insert("floAddress".into(), Value::from(self.address.as_str()));
        }
        record.insert("info".into(), self.info_value());
        record.insert(
            "details".into(),
            Value::Object(self.details.clone().into_iter().collect()),
        );
        record.insert("storage".into(), self.storage_value());
        record.insert("payment".into(), self.payment.to_value());
        if let Some(artifact_type) = self.artifact_type {
            record.insert("type".into(), Value::from(artifact_type.as_str()));
        }
        if let Some(subtype) = &self.subtype {
            record.insert("subtype".into(), Value::from(subtype.as_str()));
        }
        if let Some(signature) = &self.signature {
            record.insert("signature".into(), Value::from(signature.as_str()));
        }
        if let Some(timestamp) = self.timestamp {
            record.insert("timestamp".into(), Value::from(timestamp));
        }
        Value::Object(record)
    }

    fn info_value(&self) -> Value {
        let info = &self.info;
        let mut map = Map::new();
        if !info.title.is_empty() {
            map.insert("title".into(), Value::from(info.title.as_str()));
        }
        if !info.description.is_empty() {
            map.insert("description".into(), Value::from(info.description.as_str()));
        }
        if let Some(year) = info.year {
            map.insert("year".into(), Value::from(year));
        }
        if info.nsfw {
            map.insert("nsfw".into(), Value::Bool(true));
        }
        if !info.tags.is_empty() {
            map.insert("tags".into(), Value::from(info.tags.clone()));
        }
        Value::Object(map)
    }

    fn storage_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("network".into(), Value::from(self.storage.network.as_str()));
        if let Some(location) = &self.storage.location {
            map.insert("location".into(), Value::from(location.as_str()));
        }
        let files = self.files.iter().map(|f| f.to_value()).collect();
        map.insert("files".into(), Value::Array(files));
        Value::Object(map)
    }
}
