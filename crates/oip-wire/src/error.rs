//! Error code registry shared by every layer that reads or writes records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, machine-readable failure codes.
///
/// Batch callers key on these to decide whether to skip a record, retry a
/// collaborator, or surface the problem to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Raw record is not JSON, not an object, or lacks the nested structure
    /// its generation requires.
    MalformedInput,
    /// Record carries a generation tag this implementation does not know.
    UnsupportedGeneration,
    /// Chunks are missing, duplicated inconsistently, or do not concatenate
    /// into a parseable record.
    IncompleteMultipart,
    /// A single chunk header could not be parsed or violates framing rules.
    MalformedChunk,
    /// Record is structurally fine but lacks fields required for publishing.
    InvalidForPublish,
    /// Attempt to use a type outside the fixed enumeration.
    UnsupportedType,
    /// Record could not be serialized into its canonical form.
    EncodeFailed,
    /// An index, explorer or broadcaster call failed.
    CollaboratorFailure,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedInput => "MALFORMED_INPUT",
            Self::UnsupportedGeneration => "UNSUPPORTED_GENERATION",
            Self::IncompleteMultipart => "INCOMPLETE_MULTIPART",
            Self::MalformedChunk => "MALFORMED_CHUNK",
            Self::InvalidForPublish => "INVALID_FOR_PUBLISH",
            Self::UnsupportedType => "UNSUPPORTED_TYPE",
            Self::EncodeFailed => "ENCODE_FAILED",
            Self::CollaboratorFailure => "COLLABORATOR_FAILURE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to parse or validate a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    /// Error code from the registry.
    pub code: ErrorCode,
    /// Human-readable, single-line message.
    pub message: String,
    /// Optional machine-readable details (offending field, limits).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl WireError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Chunk text does not start with a well-formed `oip-mp(...)` header.
    pub fn malformed_header(input: &str) -> Self {
        // Keep the echo short; payloads can be close to a kilobyte.
        let head: String = input.chars().take(48).collect();
        Self::with_data(
            ErrorCode::MalformedChunk,
            format!("malformed chunk header near '{}'", head),
            serde_json::json!({ "head": head }),
        )
    }

    /// Part number is beyond the declared last index.
    pub fn part_out_of_range(part: u32, max: u32) -> Self {
        Self::with_data(
            ErrorCode::MalformedChunk,
            format!("part {} exceeds last part index {}", part, max),
            serde_json::json!({ "part": part, "max": max }),
        )
    }

    /// Chunk payload exceeds the per-chunk budget.
    pub fn payload_too_large(len: usize, max: usize) -> Self {
        Self::with_data(
            ErrorCode::MalformedChunk,
            format!("chunk payload length {} exceeds {}", len, max),
            serde_json::json!({ "len": len, "max": max }),
        )
    }

    /// A required header field is empty.
    pub fn missing_field(field: &str) -> Self {
        Self::with_data(
            ErrorCode::MalformedChunk,
            format!("chunk field '{}' is empty", field),
            serde_json::json!({ "field": field }),
        )
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for WireError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::IncompleteMultipart).unwrap();
        assert_eq!(json, "\"INCOMPLETE_MULTIPART\"");
        assert_eq!(ErrorCode::IncompleteMultipart.as_str(), "INCOMPLETE_MULTIPART");
    }

    #[test]
    fn test_malformed_header_truncates_echo() {
        let input = "x".repeat(500);
        let err = WireError::malformed_header(&input);
        assert_eq!(err.code, ErrorCode::MalformedChunk);
        assert!(err.message.len() < 100);
        assert_eq!(err.data.unwrap()["head"].as_str().unwrap().len(), 48);
    }

    #[test]
    fn test_display_includes_code() {
        let err = WireError::part_out_of_range(4, 2);
        assert_eq!(err.to_string(), "MALFORMED_CHUNK: part 4 exceeds last part index 2");
    }
}
