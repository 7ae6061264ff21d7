//! The artifact record: canonical model, decoding of every schema
//! generation, and the current-generation encoding.

mod encode;
mod file;
mod model;
mod payment;
mod schema;
mod types;

pub use file::ArtifactFile;
pub use model::{
    Artifact, DecodeState, Details, Info, Meta, Storage, TransportState, DEFAULT_NETWORK,
};
pub use payment::{Payment, Scale};
pub use schema::{DecodeMode, Generation, RawRecord};
pub use types::{capitalize, ArtifactType, SUPPORTED_TYPES};
