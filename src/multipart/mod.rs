//! Fragmenting oversized records into chunks and putting them back together.
//!
//! A record whose canonical form is at most [`FLODATA_MAX_LEN`] bytes is
//! written inline. Anything longer is cut into [`CHOP_MAX_LEN`]-byte chunks
//! by [`MultipartCodec`]; [`reassemble`] rebuilds the record from chunks
//! arriving in any order.

mod chunk_set;
mod codec;
mod reassembly;

pub use chunk_set::ChunkSet;
pub use codec::{has_generation_prefix, MultipartCodec, Transport};
pub use reassembly::{group_by_first_part, matches_reference, reassemble, reassemble_all};
pub use oip_wire::{is_multipart, Multipart, CHOP_MAX_LEN, FLODATA_MAX_LEN};

pub(crate) use reassembly::decode_chunk_set;
