//! Error types for decoding, encoding, reassembly and validation.
//!
//! Every error maps onto the stable [`ErrorCode`] registry so batch callers
//! can skip bad records without string matching.

use oip_wire::ErrorCode;
use thiserror::Error;

/// A raw record could not be turned into an [`Artifact`](crate::Artifact).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("input is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("input is not a JSON object")]
    NotAnObject,

    #[error("missing required structure: {0}")]
    MissingStructure(String),

    #[error("unsupported schema generation: {0}")]
    UnsupportedGeneration(String),

    #[error("malformed field {field}: expected {expected}")]
    MalformedField {
        field: &'static str,
        expected: &'static str,
    },
}

impl DecodeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::UnsupportedGeneration(_) => ErrorCode::UnsupportedGeneration,
            _ => ErrorCode::MalformedInput,
        }
    }
}

/// The canonical form could not be produced.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

impl EncodeError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::EncodeFailed
    }
}

/// A set of chunks could not be turned back into a record.
///
/// `Incomplete` and `Corrupt` mean the pieces themselves are unusable;
/// `Decode` means the pieces joined cleanly but the record inside is not
/// decodable.
#[derive(Debug, Error)]
pub enum ReassemblyError {
    #[error("corrupt or incomplete multipart set: missing parts {missing:?} of {count}")]
    Incomplete { missing: Vec<u32>, count: u32 },

    #[error("corrupt or incomplete multipart set: {0}")]
    Corrupt(String),

    #[error("no multipart group matches reference {0}")]
    NoMatchingGroup(String),

    #[error("reference {reference} matches {groups} multipart groups")]
    AmbiguousReference { reference: String, groups: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ReassemblyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ReassemblyError::Decode(err) => err.code(),
            _ => ErrorCode::IncompleteMultipart,
        }
    }
}

/// An artifact is missing a field required for publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title required")]
    TitleRequired,

    #[error("publishing address required")]
    AddressRequired,
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidForPublish
    }
}

/// Attempt to set a type outside the supported enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type not supported: {0}")]
pub struct UnsupportedType(pub String);

impl UnsupportedType {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::UnsupportedType
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassembly_messages_share_prefix() {
        let incomplete = ReassemblyError::Incomplete {
            missing: vec![1],
            count: 3,
        };
        let corrupt = ReassemblyError::Corrupt("trailing characters".to_string());
        assert!(incomplete
            .to_string()
            .starts_with("corrupt or incomplete multipart set"));
        assert!(corrupt
            .to_string()
            .starts_with("corrupt or incomplete multipart set"));
        assert_eq!(incomplete.code(), ErrorCode::IncompleteMultipart);
    }

    #[test]
    fn test_decode_inside_reassembly_keeps_decode_code() {
        let err = ReassemblyError::from(DecodeError::UnsupportedGeneration("oip099".into()));
        assert_eq!(err.code(), ErrorCode::UnsupportedGeneration);
        assert_eq!(err.to_string(), "unsupported schema generation: oip099");
    }

    #[test]
    fn test_validation_reasons() {
        assert_eq!(ValidationError::TitleRequired.to_string(), "title required");
        assert_eq!(
            ValidationError::AddressRequired.to_string(),
            "publishing address required"
        );
    }
}
