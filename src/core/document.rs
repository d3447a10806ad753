use std::cmp::Ordering;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::{DbError, Result, Value};

/// An insertion-ordered mapping from field names to values.
///
/// Documents are schemaless; the store never inspects them beyond the field
/// paths a query names.
#[derive(Debug, Clone, Default)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Build from a JSON value; fails with `InvalidArgument` unless the value
    /// is an object.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(DbError::InvalidArgument(format!(
                "expected a document, got {}",
                other
            ))),
        }
    }

    pub(crate) fn from_object(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        }
    }

    /// Insert a field, replacing any existing value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// First field in insertion order. Command documents are dispatched on it.
    pub fn first_field(&self) -> Option<(&str, &Value)> {
        self.fields.first().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a dotted field path, collecting every value it addresses.
    ///
    /// An array met while descending fans out: each element that is a
    /// document continues the walk. An array at the leaf contributes one
    /// entry per element (a single level; nested arrays are pushed as-is).
    /// A missing field contributes nothing.
    pub fn extract_path(&self, path: &str, out: &mut Vec<Value>) {
        let segments: Vec<&str> = path.split('.').collect();
        walk_document(self, &segments, out);
    }

    pub(crate) fn cmp_fields(&self, other: &Self) -> Ordering {
        for ((ka, va), (kb, vb)) in self.fields.iter().zip(other.fields.iter()) {
            let ord = ka.cmp(kb).then_with(|| va.cmp(vb));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.fields.len().cmp(&other.fields.len())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn walk_document(doc: &Document, segments: &[&str], out: &mut Vec<Value>) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let Some(value) = doc.get(head) else {
        return;
    };
    if rest.is_empty() {
        collect_leaf(value, out);
    } else {
        descend(value, rest, out);
    }
}

fn descend(value: &Value, segments: &[&str], out: &mut Vec<Value>) {
    match value {
        Value::Document(doc) => walk_document(doc, segments, out),
        Value::Array(items) => {
            for item in items {
                if let Value::Document(doc) = item {
                    walk_document(doc, segments, out);
                }
            }
        }
        _ => {}
    }
}

fn collect_leaf(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => out.extend(items.iter().cloned()),
        other => out.push(other.clone()),
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_fields(other) == Ordering::Equal
    }
}

impl Eq for Document {}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        Document::from_json(v).unwrap()
    }

    #[test]
    fn test_insert_preserves_order_and_replaces() {
        let mut d = Document::new();
        d.insert("b", 1i64).insert("a", 2i64).insert("b", 3i64);
        let names: Vec<&str> = d.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(d.get("b"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_extract_nested_path() {
        let d = doc(json!({"a": {"b": "x"}, "c": 12}));
        let mut out = Vec::new();
        d.extract_path("a.b", &mut out);
        assert_eq!(out, [Value::Text("x".into())]);
    }

    #[test]
    fn test_extract_missing_path() {
        let d = doc(json!({"a": 1}));
        let mut out = Vec::new();
        d.extract_path("a.b.c", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_extract_fans_out_over_arrays() {
        let d = doc(json!({"a": [{"b": 1}, {"b": 2}, 7]}));
        let mut out = Vec::new();
        d.extract_path("a.b", &mut out);
        assert_eq!(out, [Value::Integer(1), Value::Integer(2)]);

        let d = doc(json!({"tags": ["x", "y"]}));
        let mut out = Vec::new();
        d.extract_path("tags", &mut out);
        assert_eq!(out, [Value::Text("x".into()), Value::Text("y".into())]);
    }
}
