//! Core build pipeline and domain logic for docsetbuilder.
//!
//! This crate runs plugins, merges what they report, canonicalizes entry
//! paths, selects the landing page, validates every reference against the
//! package contents, and writes the final `.docset` package.

pub mod assembler;
pub mod entries;
pub mod index;
pub mod manifest;
pub mod path;
pub mod pipeline;
pub mod plugin;
pub mod validate;

pub use pipeline::{BuildReport, BuildState, ProgressReporter, SilentProgress, build_docset};
pub use plugin::{ContentIncluder, Plugin, PluginContext, PluginDescriptor, TempFolders};
