//! Ordered record collections returned by queries

use super::instance::Record;
use crate::data::{DataError, Datastore};

#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Vec<Record>,
    truncated: bool,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Primary keys of all records, in order
    pub fn ids(&self) -> Vec<i64> {
        self.records.iter().filter_map(Record::id).collect()
    }

    /// True when a filter stopped scanning before the result was complete
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    /// Delete every record in the collection from storage
    pub fn delete_all(&self, store: &Datastore) -> Result<usize, DataError> {
        let Some(first) = self.records.first() else {
            return Ok(0);
        };
        store.delete(first.class(), &self.ids())
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
            truncated: false,
        }
    }
}
