//! Attribute sets attached to recorded data points.

use std::collections::BTreeMap;

use mqtel_proto::Attribute;

/// Conventional label names.
///
/// The registry does not validate keys — call sites attach whatever labels
/// are relevant — but dashboards and alerts portable across drivers expect
/// this vocabulary.
pub mod keys {
    /// Queue driver, e.g. `"kafka"`.
    pub const DRIVER: &str = "driver";
    /// Cluster the client is connected to.
    pub const CLUSTER: &str = "cluster";
    /// Topic or queue name.
    pub const QUEUE: &str = "queue";
    /// Consumer (group) identity.
    pub const CONSUMER: &str = "consumer";
    /// Owning service name.
    pub const SERVICE: &str = "service";
    /// Error or event subtype.
    pub const TYPE: &str = "type";
    /// Partition number, as a string.
    pub const PARTITION: &str = "partition";
}

/// An order-irrelevant string-to-string label map.
///
/// Two sets with the same entries are the same series, regardless of
/// insertion order. The registry never mutates a caller's set after
/// recording; a new series clones it once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet {
    entries: BTreeMap<String, String>,
}

impl AttributeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Insert a label, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a label value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no labels are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate labels in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert to the export payload form, sorted by key.
    pub fn to_attributes(&self) -> Vec<Attribute> {
        self.entries
            .iter()
            .map(|(k, v)| Attribute::new(k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
