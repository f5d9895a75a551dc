//! Shared types, error model, and configuration for docsetbuilder.
//!
//! This crate is the foundation depended on by all other docsetbuilder crates.
//! It provides:
//! - [`DocsetError`] — the unified error type
//! - Domain types ([`Entry`], [`TypeTag`], [`DocsetEntries`], [`PluginOutput`])
//! - Configuration ([`DocsetConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    BuildConfig, CONFIG_FILE_NAME, DocsetConfig, PluginConfig, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{DocsetError, Result};
pub use types::{
    DEFAULT_INDEX_FILE_NAME, DocsetEntries, Entry, ManifestFragment, PluginOutput, TypeGroup,
    TypeTag,
};
