//! OIP artifact records
//!
//! Decodes the three schema generations of the OIP artifact record
//! (alexandria-media, oip-041, oip042) into one canonical in-memory form,
//! re-encodes it as canonical oip042 JSON, and carries records that exceed
//! a single transaction through the multipart chunk protocol.

pub mod artifact;
pub mod collab;
pub mod config;
pub mod error;
pub mod mock;
pub mod multipart;
pub mod publish;
pub mod retrieve;
pub mod signing;

pub use artifact::{Artifact, ArtifactFile, ArtifactType, DecodeMode, Generation, Payment, Scale};
pub use collab::{Broadcaster, ChunkHit, CollabError, IndexClient};
pub use error::{DecodeError, EncodeError, ReassemblyError, UnsupportedType, ValidationError};
pub use multipart::{ChunkSet, MultipartCodec, Transport};
pub use oip_wire::{ErrorCode, Multipart, WireError};
pub use publish::{PublishError, Publisher, Receipt};
pub use retrieve::{RetrieveError, Retriever};
