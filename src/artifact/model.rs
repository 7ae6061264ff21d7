//! The canonical in-memory artifact record.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use super::file::ArtifactFile;
use super::payment::{Payment, Scale};
use super::schema::Generation;
use super::types::{capitalize, ArtifactType};
use crate::error::{UnsupportedType, ValidationError};
use crate::multipart::ChunkSet;

/// Storage network used when none is given.
pub const DEFAULT_NETWORK: &str = "IPFS";

/// Open extension map. Keys are caller-defined and opaque to this crate.
pub type Details = BTreeMap<String, Value>;

/// Descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub title: String,
    pub description: String,
    pub year: Option<i64>,
    pub nsfw: bool,
    /// Unique tags, first occurrence order.
    pub tags: Vec<String>,
}

/// Where the content lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    pub network: String,
    pub location: Option<String>,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            location: None,
        }
    }
}

/// Chain provenance. Filled in by decoding index data, never hand-authored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub block: Option<u64>,
    pub block_hash: Option<String>,
    pub txid: Option<String>,
    /// Unix time of the block.
    pub time: Option<i64>,
    pub generation: Option<Generation>,
    pub signature: Option<String>,
    pub deactivated: bool,
}

/// Progress of decoding raw data into an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeState {
    /// Nothing decoded yet.
    #[default]
    Empty,
    /// A decode is in progress on a staging copy.
    Importing,
    /// Last decode succeeded and the record is publishable.
    Valid,
    /// Last decode succeeded but the record fails [`Artifact::validate`].
    Invalid,
}

/// How the canonical form is carried on the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Fits in one transaction.
    #[default]
    Unfragmented,
    /// Chunks are being computed.
    Fragmenting,
    /// A chunk set exists and matches the current canonical form.
    Fragmented,
}

/// A content-description record.
///
/// Built empty and filled through setters, or decoded once from any of the
/// three schema generations. See [`Artifact::from_serialized_string`],
/// [`Artifact::from_raw_object`] and [`Artifact::from_chunk_list`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifact {
    pub(crate) address: String,
    pub(crate) publisher_name: Option<String>,
    pub(crate) info: Info,
    pub(crate) artifact_type: Option<ArtifactType>,
    pub(crate) subtype: Option<String>,
    pub(crate) details: Details,
    pub(crate) storage: Storage,
    pub(crate) payment: Payment,
    pub(crate) files: Vec<ArtifactFile>,
    pub(crate) signature: Option<String>,
    pub(crate) timestamp: Option<i64>,
    pub(crate) meta: Meta,
    pub(crate) decode_state: DecodeState,
    pub(crate) transport_state: TransportState,
    pub(crate) chunks: Option<ChunkSet>,
}

impl Artifact {
    pub fn new() -> Self {
        Self::default()
    }

    // -- identity ---------------------------------------------------------

    /// Address that signs and publishes the record.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// Local display name; never published. Falls back to the address.
    pub fn publisher_name(&self) -> &str {
        self.publisher_name.as_deref().unwrap_or(&self.address)
    }

    pub fn set_publisher_name(&mut self, name: impl Into<String>) {
        self.publisher_name = Some(name.into());
    }

    // -- info -------------------------------------------------------------

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.info.title = title.into();
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.info.description = description.into();
    }

    pub fn year(&self) -> Option<i64> {
        self.info.year
    }

    pub fn set_year(&mut self, year: i64) {
        self.info.year = Some(year);
    }

    pub fn nsfw(&self) -> bool {
        self.info.nsfw
    }

    pub fn set_nsfw(&mut self, nsfw: bool) {
        self.info.nsfw = nsfw;
    }

    pub fn tags(&self) -> &[String] {
        &self.info.tags
    }

    /// Replace the tag list, dropping empty entries and repeats.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !tag.is_empty() && !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        self.info.tags = unique;
    }

    /// Replace the tag list from a `", "`-separated string.
    pub fn set_tags_from_str(&mut self, tags: &str) {
        self.set_tags(tags.split(", "));
    }

    // -- type -------------------------------------------------------------

    pub fn artifact_type(&self) -> Option<ArtifactType> {
        self.artifact_type
    }

    /// Set the main type. Unsupported names leave the current type in place.
    pub fn set_type(&mut self, raw: &str) -> Result<(), UnsupportedType> {
        self.artifact_type = Some(ArtifactType::parse(raw)?);
        Ok(())
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    pub fn set_subtype(&mut self, subtype: &str) {
        self.subtype = Some(capitalize(subtype));
    }

    // -- details ----------------------------------------------------------

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn set_detail(&mut self, key: impl Into<String>, value: Value) {
        self.details.insert(key.into(), value);
    }

    // -- storage ----------------------------------------------------------

    pub fn network(&self) -> &str {
        &self.storage.network
    }

    pub fn set_network(&mut self, network: &str) {
        self.storage.network = if network.eq_ignore_ascii_case("ipfs") {
            DEFAULT_NETWORK.to_string()
        } else {
            network.to_string()
        };
    }

    pub fn location(&self) -> Option<&str> {
        self.storage.location.as_deref()
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.storage.location = Some(location.into());
    }

    pub fn files(&self) -> &[ArtifactFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut Vec<ArtifactFile> {
        &mut self.files
    }

    /// Append a file descriptor. Duplicates are kept.
    pub fn add_file(&mut self, file: ArtifactFile) {
        self.files.push(file);
    }

    // -- payment ----------------------------------------------------------

    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    pub fn payment_mut(&mut self) -> &mut Payment {
        &mut self.payment
    }

    pub fn set_payment_fiat(&mut self, fiat: impl Into<String>) {
        self.payment.fiat = Some(fiat.into());
    }

    pub fn set_payment_scale(&mut self, scale: Scale) {
        self.payment.scale = Some(scale);
    }

    /// Fiat scale as a positive integer; 1 when unset.
    pub fn payment_scale(&self) -> u64 {
        self.payment.scale.as_ref().map(Scale::resolve).unwrap_or(1)
    }

    pub fn set_suggested_tips(&mut self, tips: Vec<f64>) {
        self.payment.tips = tips;
    }

    pub fn add_payment_address(&mut self, coin: &str, address: impl Into<String>) {
        self.payment.add_address(coin, address);
    }

    /// Receiving addresses per coin.
    ///
    /// With none recorded, payments go to the publishing address as `flo`.
    pub fn payment_addresses(&self) -> BTreeMap<String, String> {
        if self.payment.addresses.is_empty() && !self.address.is_empty() {
            return BTreeMap::from([("flo".to_string(), self.address.clone())]);
        }
        self.payment.addresses.clone()
    }

    pub fn payment_address(&self, coin: &str) -> Option<String> {
        self.payment_addresses().remove(&coin.to_lowercase())
    }

    pub fn supported_coins(&self) -> Vec<String> {
        self.payment_addresses().into_keys().collect()
    }

    pub fn set_retailer_cut(&mut self, cut: f64) {
        self.payment.retailer = Some(cut);
    }

    pub fn set_promoter_cut(&mut self, cut: f64) {
        self.payment.promoter = Some(cut);
    }

    pub fn set_max_discount(&mut self, max: f64) {
        self.payment.max_discount = Some(max);
    }

    pub fn add_token_rule(&mut self, rule: Value) {
        self.payment.tokens.push(rule);
    }

    pub fn token_rules(&self) -> &[Value] {
        &self.payment.tokens
    }

    // -- signature and time -----------------------------------------------

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Sets the record signature and mirrors it into the provenance meta.
    pub fn set_signature(&mut self, signature: impl Into<String>) {
        let signature = signature.into();
        self.meta.signature = Some(signature.clone());
        self.signature = Some(signature);
    }

    /// Publish time in unix seconds.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Accepts 10-digit seconds or 13-digit milliseconds (truncated to
    /// seconds). Other magnitudes are ignored.
    pub fn set_timestamp(&mut self, time: i64) {
        match time.unsigned_abs().checked_ilog10().map(|d| d + 1) {
            Some(13) => self.timestamp = Some(time / 1000),
            Some(10) => self.timestamp = Some(time),
            _ => {}
        }
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }

    /// Message a publisher signs for the record itself.
    pub fn signing_preimage(&self) -> String {
        format!(
            "{}-{}-{}",
            self.storage.location.as_deref().unwrap_or(""),
            self.address,
            self.timestamp.map(|t| t.to_string()).unwrap_or_default()
        )
    }

    // -- provenance -------------------------------------------------------

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn txid(&self) -> Option<&str> {
        self.meta.txid.as_deref()
    }

    pub fn set_txid(&mut self, txid: impl Into<String>) {
        self.meta.txid = Some(txid.into());
    }

    pub fn generation(&self) -> Option<Generation> {
        self.meta.generation
    }

    pub fn is_deactivated(&self) -> bool {
        self.meta.deactivated
    }

    pub fn decode_state(&self) -> DecodeState {
        self.decode_state
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport_state
    }

    /// Chunk set from the last fragmentation or reassembly, if any.
    pub fn chunk_set(&self) -> Option<&ChunkSet> {
        self.chunks.as_ref()
    }

    pub(crate) fn store_chunk_set(&mut self, chunks: Option<ChunkSet>) {
        self.transport_state = if chunks.is_some() {
            TransportState::Fragmented
        } else {
            TransportState::Unfragmented
        };
        self.chunks = chunks;
    }

    // -- derived ----------------------------------------------------------

    /// First free thumbnail image, else the first free image.
    pub fn thumbnail(&self) -> Option<&ArtifactFile> {
        let free_image = |f: &&ArtifactFile| {
            f.file_type.as_deref() == Some("Image") && f.play_cost() == 0.0
        };
        self.files
            .iter()
            .filter(free_image)
            .find(|f| f.subtype.as_deref() == Some("Thumbnail"))
            .or_else(|| self.files.iter().find(free_image))
    }

    /// Duration of the first file that has one, else the `duration` detail.
    pub fn duration(&self) -> Option<f64> {
        self.files
            .iter()
            .find_map(|f| f.duration)
            .or_else(|| match self.details.get("duration") {
                Some(Value::Number(n)) => n.as_f64(),
                Some(Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            })
    }

    /// True if any file carries a positive cost.
    pub fn is_paid(&self) -> bool {
        self.files.iter().any(ArtifactFile::is_paid)
    }

    // -- validity ---------------------------------------------------------

    /// Check the fields required for publishing: title, then address.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.info.title.is_empty() {
            return Err(ValidationError::TitleRequired);
        }
        if self.address.is_empty() {
            return Err(ValidationError::AddressRequired);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
