//! Record fixtures shared by the integration tests.
//!
//! One record per schema generation, taken from what the chain actually
//! carries, plus helpers for building records long enough to fragment.

#![allow(dead_code)]

use oip_record::Artifact;
use std::path::{Path, PathBuf};

pub const ALEXANDRIA_MOVIE: &str = include_str!("records/alexandria_movie.json");
pub const OIP041_IMAGE: &str = include_str!("records/oip041_image.json");
pub const OIP042_RESEARCH: &str = include_str!("records/oip042_research.json");

/// Directory holding the raw record files.
pub fn records_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/records")
}

/// A publishable record whose canonical form exceeds one transaction.
pub fn long_record(description_len: usize) -> Artifact {
    let mut artifact = Artifact::new();
    artifact.set_address("FLongRecordPublisher");
    artifact.set_title("Long Record");
    artifact.set_type("Text").unwrap();
    artifact.set_description("lorem ipsum ".repeat(description_len / 12 + 1));
    artifact.set_timestamp(1532000000);
    artifact
}
