//! Tags and the monitored resource a recording is attributed to

use std::collections::BTreeMap;

/// Ordered tag key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a tag
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Only the tags named in `keys`, in key order
    pub(crate) fn select(&self, keys: &[String]) -> Tags {
        Tags(
            keys.iter()
                .filter_map(|k| self.0.get(k).map(|v| (k.clone(), v.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The monitored resource metrics are reported for, such as a
/// `kduck_revision` with its namespace and name labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricResource {
    pub type_: String,
    pub labels: BTreeMap<String, String>,
}

impl MetricResource {
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Where a recording comes from: its tags and, optionally, the resource
#[derive(Debug, Clone, Default)]
pub struct RecordContext {
    pub tags: Tags,
    pub resource: Option<MetricResource>,
}

impl RecordContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_resource(mut self, resource: MetricResource) -> Self {
        self.resource = Some(resource);
        self
    }
}
