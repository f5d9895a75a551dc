//! Project configuration for docsetbuilder.
//!
//! The build config lives at `docset.toml` in the project's working directory.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocsetError, Result};
use crate::types::DocsetEntries;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "docset.toml";

/// Commented template written by [`init_config`].
const STARTER_CONFIG: &str = r##"# docsetbuilder configuration

# Bundle identifier; names the <identifier>.docset package.
# Defaults to the "name" in package.json, then to this directory's name.
# docset_identifier = "mylib"
# docset_name = "My Library"

# Where the package is written.
output_path = "."

# Raw documentation tree copied into the package after all plugins ran.
# docs_path = "docs"

# Directory holding icon.png / icon@2x.png.
# icons_path = "assets"

# Landing page. Without it, the index reported by the plugin marked
# use_as_index (or the only plugin) is used, then index.html.
# index_file_name = "index.html"
# index_file_dir_path = "api"

is_javascript_enabled = false
# fallback_url = "https://example.com/docs/"

# Entries known up front, by type.
# [entries.Guide]
# "Getting Started" = "guide/start.html"

# Plugins run in order.
# [[plugins]]
# name = "html"
# use_as_index = true
#
# [plugins.options]
# path = "site"
# sections = true
"##;

// ---------------------------------------------------------------------------
// Config structs (matching docset.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsetConfig {
    /// Bundle identifier; also names the `<identifier>.docset` directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docset_identifier: Option<String>,

    /// Display name (defaults to the identifier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docset_name: Option<String>,

    /// Directory the `.docset` package is written into.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Raw documentation tree copied into `Documents/` after all plugins ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_path: Option<String>,

    /// Directory holding `icon.png` / `icon@2x.png`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons_path: Option<String>,

    /// Explicit landing page file name; wins over any plugin's index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_file_name: Option<String>,

    /// Base directory that relative entry paths are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_file_dir_path: Option<String>,

    /// `DocSetPlatformFamily` (defaults to the identifier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docset_platform_family: Option<String>,

    /// `isJavaScriptEnabled` in the manifest.
    #[serde(default)]
    pub is_javascript_enabled: bool,

    /// `DashDocSetFallbackURL` in the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,

    /// Entries seeded before any plugin runs.
    #[serde(default, skip_serializing_if = "DocsetEntries::is_empty")]
    pub entries: DocsetEntries,

    /// Plugins, run in this order.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

impl Default for DocsetConfig {
    fn default() -> Self {
        Self {
            docset_identifier: None,
            docset_name: None,
            output_path: default_output_path(),
            docs_path: None,
            icons_path: None,
            index_file_name: None,
            index_file_dir_path: None,
            docset_platform_family: None,
            is_javascript_enabled: false,
            fallback_url: None,
            entries: DocsetEntries::default(),
            plugins: Vec::new(),
        }
    }
}

fn default_output_path() -> String {
    ".".into()
}

/// `[[plugins]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Registered plugin name (`static`, `html`, `command`, ...).
    pub name: String,

    /// Whether this plugin's index entry becomes the landing page.
    #[serde(default)]
    pub use_as_index: bool,

    /// Plugin-specific options, passed through untouched.
    #[serde(default = "empty_options")]
    pub options: serde_json::Value,
}

fn empty_options() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration with every default resolved and every path
/// made absolute against the working directory.
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
    pub identifier: String,
    pub name: String,
    pub platform_family: String,
    pub working_dir: PathBuf,
    pub output_path: PathBuf,
    pub docs_path: Option<PathBuf>,
    pub icons_path: Option<PathBuf>,
    pub index_file_name: Option<String>,
    pub index_file_dir_path: Option<String>,
    pub is_javascript_enabled: bool,
    pub fallback_url: Option<String>,
    pub entries: DocsetEntries,
    /// Skip content inclusion; all bookkeeping still runs.
    pub dry_run: bool,
    /// Free-form `key=value` arguments from the command line.
    pub cli_args: BTreeMap<String, String>,
}

impl BuildConfig {
    /// Resolve `config` against `working_dir`.
    pub fn resolve(config: &DocsetConfig, working_dir: &Path) -> Result<Self> {
        let identifier = match &config.docset_identifier {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => fallback_identifier(working_dir)?,
        };
        let name = config
            .docset_name
            .clone()
            .unwrap_or_else(|| identifier.clone());
        let platform_family = config
            .docset_platform_family
            .clone()
            .unwrap_or_else(|| identifier.clone());

        Ok(Self {
            platform_family,
            name,
            working_dir: working_dir.to_path_buf(),
            output_path: working_dir.join(&config.output_path),
            docs_path: config.docs_path.as_ref().map(|p| working_dir.join(p)),
            icons_path: config.icons_path.as_ref().map(|p| working_dir.join(p)),
            index_file_name: config.index_file_name.clone(),
            index_file_dir_path: config.index_file_dir_path.clone(),
            is_javascript_enabled: config.is_javascript_enabled,
            fallback_url: config.fallback_url.clone(),
            entries: config.entries.clone(),
            dry_run: false,
            cli_args: BTreeMap::new(),
            identifier,
        })
    }

    /// Builder-style setter for dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder-style setter for command-line plugin arguments.
    pub fn with_cli_args(mut self, args: BTreeMap<String, String>) -> Self {
        self.cli_args = args;
        self
    }
}

/// Identifier from `package.json`, else the working directory's name.
fn fallback_identifier(working_dir: &Path) -> Result<String> {
    let package_json = working_dir.join("package.json");
    if package_json.is_file() {
        let content = std::fs::read_to_string(&package_json)
            .map_err(|e| DocsetError::io(&package_json, e))?;
        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            DocsetError::config(format!("failed to parse {}: {e}", package_json.display()))
        })?;
        if let Some(name) = value.get("name").and_then(serde_json::Value::as_str) {
            tracing::debug!(name, "docset identifier taken from package.json");
            return Ok(name.to_string());
        }
    }

    working_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            DocsetError::config("docset_identifier is not set and cannot be derived")
        })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path to the config file inside `working_dir`.
pub fn config_file_path(working_dir: &Path) -> PathBuf {
    working_dir.join(CONFIG_FILE_NAME)
}

/// Load the project config. Returns defaults if the file does not exist.
pub fn load_config(working_dir: &Path) -> Result<DocsetConfig> {
    let path = config_file_path(working_dir);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(DocsetConfig::default());
    }

    load_config_from(&path)
}

/// Load the project config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<DocsetConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsetError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocsetError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a commented starter config file into `working_dir`.
/// Refuses to overwrite an existing file. Returns the path to the created file.
pub fn init_config(working_dir: &Path) -> Result<PathBuf> {
    let path = config_file_path(working_dir);
    if path.exists() {
        return Err(DocsetError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    std::fs::write(&path, STARTER_CONFIG).map_err(|e| DocsetError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
