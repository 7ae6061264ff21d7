//! Layered configuration
//!
//! Built-in defaults, then an optional TOML file, then CLI overrides.
//! Protocol constants are never read from here.

mod defaults;
mod merge;
mod settings;

pub use defaults::{builtin_layer, DEFAULT_LOG_FILTER, DEFAULT_SEARCH_PREFIX_LEN};
pub use merge::{merge_layers, overlay};
pub use settings::{
    ConfigError, ConfigOrigin, ConfigSource, IndexSettings, LoadedSettings, Settings,
};
