//! Core domain types for docset entries and plugin output.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Index page used when neither the config nor a plugin names one.
pub const DEFAULT_INDEX_FILE_NAME: &str = "index.html";

/// Reserved key of the landing page inside an entries map.
const INDEX_KEY: &str = "index";

// ---------------------------------------------------------------------------
// TypeTag
// ---------------------------------------------------------------------------

/// Kind of a documentation item (`Class`, `Function`, `Guide`, ...).
///
/// Opaque: any string is accepted and written to the search index as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(pub String);

impl TypeTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One named, typed reference to a location inside the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// `None` only for the synthetic index entry.
    pub entry_type: Option<TypeTag>,
    /// Display name.
    pub name: String,
    /// Path exactly as the plugin reported it.
    pub raw_path: String,
    /// Package-relative path after normalization.
    pub canonical_path: String,
}

impl Entry {
    /// Type label used in logs and error messages.
    pub fn type_label(&self) -> &str {
        self.entry_type.as_ref().map_or(INDEX_KEY, TypeTag::as_str)
    }
}

// ---------------------------------------------------------------------------
// DocsetEntries
// ---------------------------------------------------------------------------

/// Entries of one type, in reported order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGroup {
    pub entry_type: TypeTag,
    /// `(name, raw path)` pairs.
    pub items: Vec<(String, String)>,
}

/// Raw entries as reported by plugins (or seeded from the config).
///
/// The serialized form is a map: the reserved `index` key holds the landing
/// page path, every other key is a type whose value maps names to paths.
/// Key order is preserved in both directions.
///
/// ```toml
/// index = "index.html"
///
/// [Class]
/// Foo = "api/foo.html"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocsetEntries {
    /// Landing page path, if this source reports one.
    pub index: Option<String>,
    /// Typed groups in first-seen order.
    groups: Vec<TypeGroup>,
    /// Position of each type in `groups`.
    positions: HashMap<TypeTag, usize>,
    seen: HashSet<(TypeTag, String, String)>,
}

impl DocsetEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the index path.
    pub fn with_index(mut self, path: impl Into<String>) -> Self {
        self.index = Some(path.into());
        self
    }

    /// Builder-style variant of [`DocsetEntries::push`].
    pub fn with_entry(
        mut self,
        entry_type: impl Into<TypeTag>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.push(entry_type, name, path);
        self
    }

    /// Append an entry unless the same `(type, name, path)` is already present.
    /// Returns `true` when the entry was added.
    pub fn push(
        &mut self,
        entry_type: impl Into<TypeTag>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> bool {
        let entry_type = entry_type.into();
        let (name, path) = (name.into(), path.into());

        if !self
            .seen
            .insert((entry_type.clone(), name.clone(), path.clone()))
        {
            return false;
        }
        match self.positions.get(&entry_type) {
            Some(&pos) => self.groups[pos].items.push((name, path)),
            None => {
                self.positions.insert(entry_type.clone(), self.groups.len());
                self.groups.push(TypeGroup {
                    entry_type,
                    items: vec![(name, path)],
                });
            }
        }
        true
    }

    /// Typed groups in first-seen order.
    pub fn groups(&self) -> &[TypeGroup] {
        &self.groups
    }

    /// Union `other` into `self`. Existing entries are never replaced; a
    /// reported index overwrites the current one.
    pub fn merge(&mut self, other: &DocsetEntries) {
        if let Some(index) = &other.index {
            self.index = Some(index.clone());
        }
        for group in &other.groups {
            for (name, path) in &group.items {
                self.push(group.entry_type.clone(), name.as_str(), path.as_str());
            }
        }
    }

    /// Iterate `(type, name, raw path)` in insertion order (index excluded).
    pub fn iter(&self) -> impl Iterator<Item = (&TypeTag, &str, &str)> {
        self.groups.iter().flat_map(|g| {
            g.items
                .iter()
                .map(move |(name, path)| (&g.entry_type, name.as_str(), path.as_str()))
        })
    }

    /// Number of typed entries (index excluded).
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.groups.is_empty()
    }
}

impl Serialize for DocsetEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.groups.len() + usize::from(self.index.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(index) = &self.index {
            map.serialize_entry(INDEX_KEY, index)?;
        }
        for group in &self.groups {
            map.serialize_entry(group.entry_type.as_str(), &Pairs(&group.items))?;
        }
        map.end()
    }
}

/// Serializes `(name, path)` pairs as an ordered map.
struct Pairs<'a>(&'a [(String, String)]);

impl Serialize for Pairs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, path) in self.0 {
            map.serialize_entry(name, path)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DocsetEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = DocsetEntries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of entry types to name/path maps")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = DocsetEntries::new();
        while let Some(key) = access.next_key::<String>()? {
            if key == INDEX_KEY {
                entries.index = Some(access.next_value()?);
                continue;
            }
            let OrderedPairs(items) = access.next_value()?;
            for (name, path) in items {
                entries.push(key.as_str(), name, path);
            }
        }
        Ok(entries)
    }
}

/// Deserializes a name → path map without losing its order.
struct OrderedPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of entry names to paths")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(pair) = access.next_entry::<String, String>()? {
                    items.push(pair);
                }
                Ok(OrderedPairs(items))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

// ---------------------------------------------------------------------------
// Plugin output
// ---------------------------------------------------------------------------

/// Manifest additions contributed by a single plugin (key → value).
pub type ManifestFragment = BTreeMap<String, String>;

/// Everything a plugin hands back to the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginOutput {
    #[serde(default)]
    pub entries: DocsetEntries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestFragment>,
}

impl PluginOutput {
    pub fn new(entries: DocsetEntries) -> Self {
        Self {
            entries,
            manifest: None,
        }
    }

    /// Attach a manifest addition.
    pub fn with_manifest(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.manifest
            .get_or_insert_with(ManifestFragment::new)
            .insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_ignores_exact_duplicates() {
        let mut entries = DocsetEntries::new();
        assert!(entries.push("Class", "Foo", "a.html"));
        assert!(!entries.push("Class", "Foo", "a.html"));
        assert!(entries.push("Class", "Foo", "b.html"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn merge_is_additive_and_ordered() {
        let mut merged = DocsetEntries::new().with_entry("Class", "Foo", "a.html");
        let other = DocsetEntries::new()
            .with_entry("Class", "Bar", "b.html")
            .with_entry("Function", "run", "run.html");
        merged.merge(&other);

        let names: Vec<_> = merged.iter().map(|(_, name, _)| name).collect();
        assert_eq!(names, ["Foo", "Bar", "run"]);
        assert!(merged.index.is_none());
    }

    #[test]
    fn large_merge_dedupes() {
        const N: usize = 200_000;
        let mut first = DocsetEntries::new();
        for i in 0..N {
            first.push("Method", format!("m{i}"), format!("api/{i}.html"));
        }
        let mut second = DocsetEntries::new();
        for i in (0..N).step_by(2) {
            second.push("Method", format!("m{i}"), format!("api/{i}.html"));
            second.push("Field", format!("f{i}"), format!("api/{i}.html#f"));
        }

        first.merge(&second);
        assert_eq!(first.len(), N + N / 2);
        assert_eq!(first.groups().len(), 2);
        assert_eq!(first.groups()[0].items.len(), N);
        assert_eq!(first.groups()[1].entry_type.as_str(), "Field");
        assert!(!first.push("Field", "f0", "api/0.html#f"));
    }

    #[test]
    fn merge_overwrites_index_only() {
        let mut merged = DocsetEntries::new().with_index("a/index.html");
        merged.merge(&DocsetEntries::new().with_index("b/index.html"));
        assert_eq!(merged.index.as_deref(), Some("b/index.html"));

        merged.merge(&DocsetEntries::new());
        assert_eq!(merged.index.as_deref(), Some("b/index.html"));
    }

    #[test]
    fn json_preserves_key_order() {
        let json = r#"{
            "index": "index.html",
            "Function": { "zeta": "z.html", "alpha": "a.html" },
            "Class": { "Foo": "foo.html" }
        }"#;
        let entries: DocsetEntries = serde_json::from_str(json).expect("deserialize");
        assert_eq!(entries.index.as_deref(), Some("index.html"));
        assert_eq!(entries.groups()[0].entry_type.as_str(), "Function");
        assert_eq!(entries.groups()[0].items[0].0, "zeta");
        assert_eq!(entries.groups()[1].entry_type.as_str(), "Class");

        let back = serde_json::to_string(&entries).expect("serialize");
        assert!(back.starts_with(r#"{"index":"index.html","Function":{"zeta""#));
    }

    #[test]
    fn toml_entries_table() {
        let toml_str = r#"
index = "guide/"

[Guide]
"Getting Started" = "guide/start.html"
"#;
        let entries: DocsetEntries = toml::from_str(toml_str).expect("parse");
        assert_eq!(entries.index.as_deref(), Some("guide/"));
        assert_eq!(entries.len(), 1);
        let (ty, name, path) = entries.iter().next().expect("one entry");
        assert_eq!(ty.as_str(), "Guide");
        assert_eq!(name, "Getting Started");
        assert_eq!(path, "guide/start.html");
    }

    #[test]
    fn plugin_output_defaults() {
        let output: PluginOutput = serde_json::from_str("{}").expect("deserialize");
        assert!(output.entries.is_empty());
        assert!(output.manifest.is_none());

        let output = PluginOutput::new(DocsetEntries::new()).with_manifest("DashDocSetFamily", "js");
        assert_eq!(
            output.manifest.and_then(|m| m.get("DashDocSetFamily").cloned()),
            Some("js".to_string())
        );
    }
}
