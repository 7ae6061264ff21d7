//! The fixed set of artifact main types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnsupportedType;

/// Artifact main type. Subtypes are free-form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactType {
    Audio,
    Video,
    Image,
    Text,
    Software,
    Web,
    Research,
    Property,
}

/// Every supported main type, in registry order.
pub const SUPPORTED_TYPES: [ArtifactType; 8] = [
    ArtifactType::Audio,
    ArtifactType::Video,
    ArtifactType::Image,
    ArtifactType::Text,
    ArtifactType::Software,
    ArtifactType::Web,
    ArtifactType::Research,
    ArtifactType::Property,
];

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Audio => "Audio",
            ArtifactType::Video => "Video",
            ArtifactType::Image => "Image",
            ArtifactType::Text => "Text",
            ArtifactType::Software => "Software",
            ArtifactType::Web => "Web",
            ArtifactType::Research => "Research",
            ArtifactType::Property => "Property",
        }
    }

    /// Case-normalize and look up a type name (`"video"` → `Video`).
    pub fn parse(raw: &str) -> Result<Self, UnsupportedType> {
        let normalized = capitalize(raw.trim());
        SUPPORTED_TYPES
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnsupportedType(raw.to_string()))
    }
}

impl FromStr for ArtifactType {
    type Err = UnsupportedType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        assert_eq!(ArtifactType::parse("video").unwrap(), ArtifactType::Video);
        assert_eq!(ArtifactType::parse("RESEARCH").unwrap(), ArtifactType::Research);
        assert_eq!("Audio".parse::<ArtifactType>().unwrap(), ArtifactType::Audio);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = ArtifactType::parse("podcast").unwrap_err();
        assert_eq!(err, UnsupportedType("podcast".to_string()));
        assert!(ArtifactType::parse("").is_err());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("tomogram"), "Tomogram");
        assert_eq!(capitalize("bOOK"), "Book");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("é"), "É");
    }
}
