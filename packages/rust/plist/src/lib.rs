//! `Info.plist` generation for docset packages.
//!
//! [`InfoPlist`] holds the identity/display fields every docset needs plus the
//! ordered, multi-valued additions contributed by plugins. Rendering goes
//! through [`PlistWriter`], which escapes every text node.

use std::path::Path;

use docsetbuilder_shared::{DocsetError, Result};
use tracing::debug;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
"#;

/// Manifest contents of a docset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPlist {
    /// `CFBundleIdentifier`.
    pub identifier: String,
    /// `CFBundleName`.
    pub name: String,
    /// `DocSetPlatformFamily`.
    pub platform_family: String,
    /// `dashIndexFilePath`, package-relative with `/` separators.
    pub index_file_path: String,
    /// `isJavaScriptEnabled`.
    pub javascript_enabled: bool,
    /// `DashDocSetFallbackURL`.
    pub fallback_url: Option<String>,
    /// Plugin additions: each key is written once per value, in order.
    pub additions: Vec<(String, Vec<String>)>,
}

impl InfoPlist {
    /// Render the full XML document.
    pub fn render(&self) -> String {
        let mut w = PlistWriter::new();
        w.string("CFBundleIdentifier", &self.identifier);
        w.string("CFBundleName", &self.name);
        w.string("DocSetPlatformFamily", &self.platform_family);
        w.boolean("isDashDocset", true);
        w.string("dashIndexFilePath", &self.index_file_path);
        w.boolean("isJavaScriptEnabled", self.javascript_enabled);
        if let Some(url) = &self.fallback_url {
            w.string("DashDocSetFallbackURL", url);
        }
        for (key, values) in &self.additions {
            for value in values {
                w.string(key, value);
            }
        }
        w.finish()
    }

    /// Render and write to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocsetError::io(parent, e))?;
        }
        std::fs::write(path, self.render()).map_err(|e| DocsetError::io(path, e))?;
        debug!(path = %path.display(), additions = self.additions.len(), "wrote Info.plist");
        Ok(())
    }
}

/// Minimal builder for a flat plist `<dict>`.
pub struct PlistWriter {
    buf: String,
}

impl PlistWriter {
    pub fn new() -> Self {
        let mut buf = String::from(XML_HEADER);
        buf.push_str("<plist version=\"1.0\">\n<dict>\n");
        Self { buf }
    }

    fn key(&mut self, key: &str) {
        self.buf.push_str("  <key>");
        self.buf.push_str(&escape(key));
        self.buf.push_str("</key>\n");
    }

    /// `<key>k</key><string>v</string>`
    pub fn string(&mut self, key: &str, value: &str) {
        self.key(key);
        self.buf.push_str("  <string>");
        self.buf.push_str(&escape(value));
        self.buf.push_str("</string>\n");
    }

    /// `<key>k</key><true/>` or `<false/>`
    pub fn boolean(&mut self, key: &str, value: bool) {
        self.key(key);
        self.buf
            .push_str(if value { "  <true/>\n" } else { "  <false/>\n" });
    }

    /// Close the dict and return the document.
    pub fn finish(mut self) -> String {
        self.buf.push_str("</dict>\n</plist>\n");
        self.buf
    }
}

impl Default for PlistWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape XML markup characters.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
