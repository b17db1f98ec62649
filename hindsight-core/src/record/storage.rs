//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::BTreeSet;

/// Stores records and aggregates them on demand.
///
/// Scalars are reduced to their mean under the original key, with `_min`
/// and `_max` companions when more than one value was stored. Other values
/// keep the most recent entry.
#[derive(Debug, Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn mean(vs: &[f64]) -> f64 {
    vs.iter().sum::<f64>() / vs.len() as f64
}

fn min(vs: &[f64]) -> f64 {
    vs.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(vs: &[f64]) -> f64 {
    vs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keys of all stored records, sorted.
    fn keys(&self) -> BTreeSet<String> {
        self.data
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect()
    }

    fn latest(&self, key: &str) -> Option<&RecordValue> {
        self.data.iter().rev().find_map(|record| record.get(key))
    }

    fn scalar(&self, key: &str) -> Record {
        let vs: Vec<f64> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                _ => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_scalar(key, vs[0])
        } else {
            Record::from_slice(&[
                (key.to_string(), RecordValue::Scalar(mean(&vs))),
                (format!("{}_min", key), RecordValue::Scalar(min(&vs))),
                (format!("{}_max", key), RecordValue::Scalar(max(&vs))),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.keys().iter() {
            match self.latest(key) {
                Some(RecordValue::Scalar(..)) => record.merge_inplace(self.scalar(key)),
                Some(value) => record.insert(key.clone(), value.clone()),
                None => {}
            }
        }

        self.data.clear();
        record
    }
}
