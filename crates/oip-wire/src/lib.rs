//! OIP Wire Types
//!
//! Protocol constants, the chunk ("multipart") framing used when a record is
//! too large for a single transaction, and the stable error code registry.

pub mod error;
pub mod multipart;

pub use error::{ErrorCode, WireError};
pub use multipart::{is_multipart, Multipart};

/// Maximum payload length of a single chunk, in bytes.
///
/// Changing this breaks every previously published chunk set.
pub const CHOP_MAX_LEN: usize = 890;

/// Largest transaction data written inline; anything longer is fragmented.
pub const FLODATA_MAX_LEN: usize = 1040;

/// Optional marker in front of an inline JSON record.
pub const JSON_PREFIX: &str = "json:";

/// Marker in front of every chunk header.
pub const MULTIPART_PREFIX: &str = "oip-mp";

/// Generation tag of the oldest record schema.
pub const GENERATION_ALEXANDRIA: &str = "alexandria-media";

/// Generation tag of the intermediate record schema.
pub const GENERATION_OIP041: &str = "oip041";

/// Generation tag of the current record schema.
pub const GENERATION_OIP042: &str = "oip042";

/// Strip the optional `json:` marker from transaction data.
pub fn strip_json_prefix(data: &str) -> &str {
    data.strip_prefix(JSON_PREFIX).unwrap_or(data)
}
