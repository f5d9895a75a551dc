//! Built-in plugins and the registry that instantiates them from config.
//!
//! This crate provides:
//! - [`StaticPlugin`] — includes a directory and returns entries listed in its options
//! - [`HtmlPlugin`] — scans HTML pages and derives one entry per page (plus sections)
//! - [`CommandPlugin`] — delegates to an external program over a JSON stdin/stdout exchange
//! - [`PluginRegistry`] — maps `[[plugins]]` names to constructors

mod command;
mod html;
mod registry;
mod static_entries;

use docsetbuilder_shared::{DocsetError, Result};
use serde::de::DeserializeOwned;

pub use command::CommandPlugin;
pub use html::HtmlPlugin;
pub use registry::{PluginFactory, PluginRegistry};
pub use static_entries::StaticPlugin;

/// Deserialize a plugin's options, reporting failures against the plugin.
pub(crate) fn parse_options<T: DeserializeOwned>(
    plugin: &str,
    options: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(options.clone())
        .map_err(|e| DocsetError::plugin(plugin, format!("invalid options: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use docsetbuilder_core::{ContentIncluder, PluginContext, TempFolders};
    use docsetbuilder_shared::{BuildConfig, DocsetConfig};

    /// Owns everything a [`PluginContext`] borrows.
    pub struct Harness {
        pub dir: PathBuf,
        pub documents: PathBuf,
        pub config: BuildConfig,
        pub options: serde_json::Value,
        pub cli_args: BTreeMap<String, String>,
        temp: TempFolders,
        includer: ContentIncluder,
    }

    impl Harness {
        pub fn new(label: &str, options: serde_json::Value) -> Self {
            let dir = std::env::temp_dir().join(format!("dsb-{label}-{}", uuid::Uuid::now_v7()));
            std::fs::create_dir_all(&dir).unwrap();
            let config = BuildConfig::resolve(
                &DocsetConfig {
                    docset_identifier: Some("testlib".into()),
                    ..DocsetConfig::default()
                },
                &dir,
            )
            .unwrap();
            let documents = dir.join("Documents");
            Self {
                temp: TempFolders::new(dir.join("._docset_tmp")),
                includer: ContentIncluder::new(&documents, false),
                documents,
                config,
                options,
                cli_args: BTreeMap::new(),
                dir,
            }
        }

        pub fn ctx(&self) -> PluginContext<'_> {
            PluginContext {
                cli_args: &self.cli_args,
                plugin_options: &self.options,
                main_options: &self.config,
                working_dir: &self.dir,
                temp: &self.temp,
                includer: &self.includer,
            }
        }

        pub fn write(&self, rel: &str, content: &str) {
            let path = self.dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }
}
