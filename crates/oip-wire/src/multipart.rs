//! Chunk framing.
//!
//! Every chunk is written as a single transaction:
//!
//! ```text
//! oip-mp(<part>,<max>,<publisher>,<firstPartTxid>,<signature>):<payload>
//! ```
//!
//! `max` is the index of the last chunk, so a set has `max + 1` chunks.
//! Chunk 0 leaves `firstPartTxid` empty; later chunks carry chunk 0's
//! transaction id once it is known. The payload runs verbatim to the end of
//! the string and may contain any character.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::WireError;
use crate::{CHOP_MAX_LEN, MULTIPART_PREFIX};

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^oip-mp\((\d+),(\d+),([^,()]*),([^,()]*),([^()]*)\):")
            .expect("chunk header pattern is valid")
    })
}

/// Returns true if transaction data looks like a chunk rather than a record.
pub fn is_multipart(data: &str) -> bool {
    data.starts_with(MULTIPART_PREFIX) && data[MULTIPART_PREFIX.len()..].starts_with('(')
}

/// One transport-sized slice of a serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multipart {
    /// Zero-based position of this chunk.
    pub part_number: u32,

    /// Index of the last chunk; identical across a set.
    pub total_parts: u32,

    /// Signing identity of the publisher.
    pub publisher_address: String,

    /// Transaction id of chunk 0 (absent on chunk 0 itself and before linking).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_part_reference: Option<String>,

    /// Base64 signature over [`Multipart::signing_preimage`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Raw slice of the serialized record.
    pub payload: String,

    /// Chunk 0 only: the full serialization starts with a known generation
    /// wrapper. Not part of the wire header.
    #[serde(default)]
    pub has_generation_prefix: bool,

    /// Transaction id assigned once this chunk is anchored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_id: Option<String>,
}

impl Multipart {
    pub fn new(
        part_number: u32,
        total_parts: u32,
        publisher_address: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            part_number,
            total_parts,
            publisher_address: publisher_address.into(),
            first_part_reference: None,
            signature: None,
            payload: payload.into(),
            has_generation_prefix: false,
            transport_id: None,
        }
    }

    /// True only for part 0; the first part anchors the whole set.
    pub fn is_first_part(&self) -> bool {
        self.part_number == 0
    }

    pub fn is_last_part(&self) -> bool {
        self.part_number == self.total_parts
    }

    /// Number of chunks in the set this chunk belongs to.
    pub fn chunk_count(&self) -> u32 {
        self.total_parts.saturating_add(1)
    }

    /// Key that ties this chunk to its set.
    ///
    /// Chunk 0 is keyed by its own transaction id, every other chunk by the
    /// reference it carries. `None` until the relevant id is known.
    pub fn group_key(&self) -> Option<&str> {
        if self.is_first_part() {
            self.transport_id.as_deref()
        } else {
            self.first_part_reference.as_deref()
        }
        .filter(|k| !k.is_empty())
    }

    /// Message a publisher signs for this chunk.
    pub fn signing_preimage(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.part_number,
            self.total_parts,
            self.publisher_address,
            self.first_part_reference.as_deref().unwrap_or(""),
            self.payload
        )
    }

    /// Render the chunk as transaction data.
    pub fn to_wire(&self) -> String {
        format!(
            "{}({},{},{},{},{}):{}",
            MULTIPART_PREFIX,
            self.part_number,
            self.total_parts,
            self.publisher_address,
            self.first_part_reference.as_deref().unwrap_or(""),
            self.signature.as_deref().unwrap_or(""),
            self.payload
        )
    }

    /// Parse transaction data into a chunk.
    pub fn parse(data: &str) -> Result<Self, WireError> {
        let caps = header_pattern()
            .captures(data)
            .ok_or_else(|| WireError::malformed_header(data))?;

        let header_len = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
        let number = |i: usize| {
            field(i)
                .parse::<u32>()
                .map_err(|_| WireError::malformed_header(data))
        };
        let optional = |i: usize| {
            let value = field(i);
            (!value.is_empty()).then(|| value.to_string())
        };

        let part_number = number(1)?;
        let total_parts = number(2)?;

        Ok(Self {
            part_number,
            total_parts,
            publisher_address: field(3).to_string(),
            first_part_reference: optional(4),
            signature: optional(5),
            payload: data[header_len..].to_string(),
            has_generation_prefix: false,
            transport_id: None,
        })
    }

    /// Parse transaction data that is already anchored under `transport_id`.
    pub fn parse_anchored(data: &str, transport_id: impl Into<String>) -> Result<Self, WireError> {
        let mut part = Self::parse(data)?;
        part.transport_id = Some(transport_id.into());
        Ok(part)
    }

    /// Check framing rules that parsing alone does not enforce.
    ///
    /// The payload limit is counted in bytes, which is what this crate
    /// writes.
    pub fn validate(&self) -> Result<(), WireError> {
        self.check_framing()?;
        if self.payload.len() > CHOP_MAX_LEN {
            return Err(WireError::payload_too_large(self.payload.len(), CHOP_MAX_LEN));
        }
        Ok(())
    }

    /// Framing checks for chunks read back from the chain.
    ///
    /// Older publishers cut payloads by character count, so a payload of up
    /// to `CHOP_MAX_LEN` characters is accepted whatever its byte length.
    pub fn validate_received(&self) -> Result<(), WireError> {
        self.check_framing()?;
        let chars = self.payload.chars().count();
        if chars > CHOP_MAX_LEN {
            return Err(WireError::payload_too_large(chars, CHOP_MAX_LEN));
        }
        Ok(())
    }

    fn check_framing(&self) -> Result<(), WireError> {
        if self.part_number > self.total_parts {
            return Err(WireError::part_out_of_range(self.part_number, self.total_parts));
        }
        if self.publisher_address.is_empty() {
            return Err(WireError::missing_field("publisher"));
        }
        if self.payload.is_empty() {
            return Err(WireError::missing_field("payload"));
        }
        if !self.is_first_part()
            && self.transport_id.is_some()
            && self.transport_id == self.first_part_reference
        {
            return Err(WireError::missing_field("firstPartTxid"));
        }
        Ok(())
    }
}
