//! Untyped upstream records.
//!
//! The search collaborator hands back each result as a JSON object keyed the
//! way Scholar scrapers conventionally name things (`scholar_id`, `bib.title`,
//! `num_citations`, ...). Nothing downstream assumes more than key lookup.

use crate::error::{ScholarError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single result record as produced by a [`crate::scholar::ScholarSource`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a field by dotted path (`"bib.title"`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut keys = path.split('.');
        let first = self.0.get(keys.next()?)?;
        keys.try_fold(first, |value, key| value.as_object()?.get(key))
    }

    /// Copy a field that must be present.
    ///
    /// A field explicitly set to `null` counts as present.
    pub fn require(&self, path: &str) -> Result<Value> {
        self.get(path)
            .cloned()
            .ok_or_else(|| ScholarError::MissingField(path.to_string()))
    }

    /// Copy a field that may be absent, yielding `null` when it is
    pub fn optional(&self, path: &str) -> Value {
        self.get(path).cloned().unwrap_or(Value::Null)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = ScholarError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ScholarError::Parse(format!(
                "expected a JSON object record, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::try_from(value).expect("object record")
    }

    #[test]
    fn test_nested_lookup() {
        let r = record(json!({"bib": {"title": "Deep Learning"}, "gsrank": 1}));
        assert_eq!(r.get("bib.title"), Some(&json!("Deep Learning")));
        assert_eq!(r.get("gsrank"), Some(&json!(1)));
        assert_eq!(r.get("bib.venue"), None);
        assert_eq!(r.get("gsrank.inner"), None);
    }

    #[test]
    fn test_require_reports_path() {
        let r = record(json!({"bib": {}}));
        match r.require("bib.title") {
            Err(ScholarError::MissingField(path)) => assert_eq!(path, "bib.title"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_optional_defaults_to_null() {
        let r = record(json!({"eprint_url": "https://arxiv.org/pdf/1"}));
        assert_eq!(r.optional("eprint_url"), json!("https://arxiv.org/pdf/1"));
        assert_eq!(r.optional("pub_url"), Value::Null);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Record::try_from(json!([1, 2])).is_err());
    }
}
