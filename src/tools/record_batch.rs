use std::collections::HashMap;
use std::hash::Hash;

/// In-memory batch of records keyed by their unique fields.
///
/// Adding a record whose key is already present replaces it, so each batch
/// holds at most one record per unique key. Records drain in the order their
/// key was first seen.
#[derive(Debug, Clone)]
pub struct RecordBatch<K, V> {
    index: HashMap<K, usize>,
    records: Vec<V>,
}

impl<K: Hash + Eq, V> Default for RecordBatch<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            records: Vec::new(),
        }
    }
}

impl<K: Hash + Eq, V> RecordBatch<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, record: V) {
        match self.index.get(&key) {
            Some(&position) => self.records[position] = record,
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[V] {
        &self.records
    }

    /// Take every record out, leaving the batch empty
    pub fn drain(&mut self) -> Vec<V> {
        self.index.clear();
        std::mem::take(&mut self.records)
    }
}

/// Render a count with thousands separators, e.g. `10,000`
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}
