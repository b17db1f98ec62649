//! Base implementation of records.
use crate::error::HindsightError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{IntoIter, Iter, Keys},
    HashMap,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, typically a metric like loss or episode reward.
    Scalar(f64),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f64>),

    /// A text value.
    String(String),
}

/// A container for storing key-value pairs of various data types.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f64) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator that consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records. Values of `record` win on shared keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f64, HindsightError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(HindsightError::RecordValueType("Scalar".to_string())),
            None => Err(HindsightError::RecordKey(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f64>, HindsightError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(HindsightError::RecordValueType("Array1".to_string())),
            None => Err(HindsightError::RecordKey(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, HindsightError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(HindsightError::RecordValueType("String".to_string())),
            None => Err(HindsightError::RecordKey(k.to_string())),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_right() {
        let a = Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.0)),
            ("tag", RecordValue::String("a".into())),
        ]);
        let b = Record::from_scalar("loss", 0.5);
        let merged = a.merge(b);
        assert_eq!(merged.get_scalar("loss").unwrap(), 0.5);
        assert_eq!(merged.get_string("tag").unwrap(), "a");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_lookup_errors() {
        let r = Record::from_scalar("loss", 0.5);
        assert_eq!(
            r.get_scalar("q"),
            Err(HindsightError::RecordKey("q".to_string()))
        );
        assert_eq!(
            r.get_string("loss"),
            Err(HindsightError::RecordValueType("String".to_string()))
        );
    }
}
