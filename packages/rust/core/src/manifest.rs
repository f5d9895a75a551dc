//! Accumulates manifest additions contributed by plugins.

use docsetbuilder_shared::ManifestFragment;

/// Ordered key → values map. Keys keep the order of their first
/// contribution; values keep plugin order. Nothing is ever overwritten.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManifestAccumulator {
    fields: Vec<(String, Vec<String>)>,
}

impl ManifestAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((key, vec![value])),
        }
    }

    /// Append every key of one plugin's fragment.
    pub fn add_fragment(&mut self, fragment: &ManifestFragment) {
        for (key, value) in fragment {
            self.add(key.as_str(), value.as_str());
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn fields(&self) -> &[(String, Vec<String>)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, Vec<String>)> {
        self.fields
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_append_in_plugin_order() {
        let mut acc = ManifestAccumulator::new();
        acc.add_fragment(&ManifestFragment::from([
            ("DashDocSetKeyword".to_string(), "js".to_string()),
        ]));
        acc.add_fragment(&ManifestFragment::from([
            ("DashDocSetFamily".to_string(), "dashtoc".to_string()),
            ("DashDocSetKeyword".to_string(), "node".to_string()),
        ]));

        assert_eq!(acc.len(), 2);
        assert_eq!(acc.fields()[0].0, "DashDocSetKeyword");
        assert_eq!(acc.get("DashDocSetKeyword"), Some(&["js".to_string(), "node".to_string()][..]));
        assert_eq!(acc.get("DashDocSetFamily"), Some(&["dashtoc".to_string()][..]));
        assert!(acc.get("missing").is_none());
    }

    #[test]
    fn empty_fragment_changes_nothing() {
        let mut acc = ManifestAccumulator::new();
        acc.add_fragment(&ManifestFragment::new());
        assert!(acc.is_empty());
    }
}
