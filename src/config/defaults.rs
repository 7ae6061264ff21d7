//! Built-in defaults (layer 1)

use serde_json::{json, Value};

/// Length of the txid prefix used when searching for sibling chunks.
pub const DEFAULT_SEARCH_PREFIX_LEN: usize = 10;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Built-in layer in the same shape as the TOML file.
pub fn builtin_layer() -> Value {
    json!({
        "log_filter": DEFAULT_LOG_FILTER,
        "index": {
            "search_prefix_len": DEFAULT_SEARCH_PREFIX_LEN
        }
    })
}
