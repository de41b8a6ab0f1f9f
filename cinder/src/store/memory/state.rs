use im::{OrdMap, OrdSet};
use std::collections::BTreeMap;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::IndexDescriptor;

#[derive(Clone)]
struct MemoryIndex {
    descriptor: IndexDescriptor,
    entries: OrdMap<Value, OrdSet<String>>,
}

impl MemoryIndex {
    fn new(descriptor: IndexDescriptor) -> Self {
        MemoryIndex {
            descriptor,
            entries: OrdMap::new(),
        }
    }

    fn add(&mut self, key: &str, record: &Document) {
        if let Some(value) = record.get_path(self.descriptor.field()) {
            self.entries
                .entry(value.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn remove(&mut self, key: &str, record: &Document) {
        if let Some(value) = record.get_path(self.descriptor.field()) {
            let now_empty = match self.entries.get_mut(value) {
                Some(keys) => {
                    keys.remove(key);
                    keys.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.entries.remove(value);
            }
        }
    }
}

/// Records plus their index entries. Cloning is O(1).
#[derive(Clone, Default)]
pub(crate) struct MemoryState {
    records: OrdMap<String, Document>,
    indexes: BTreeMap<String, MemoryIndex>,
}

impl MemoryState {
    pub(crate) fn get(&self, key: &str) -> Option<&Document> {
        self.records.get(key)
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub(crate) fn values(&self) -> Vec<Document> {
        self.records.values().cloned().collect()
    }

    pub(crate) fn lookup(&self, index: &str, value: &Value) -> CinderResult<Vec<Document>> {
        let index = match self.indexes.get(index) {
            Some(index) => index,
            None => {
                log::error!("Index {} does not exist", index);
                return Err(CinderError::new(
                    &format!("Index {} does not exist", index),
                    ErrorKind::StoreError,
                ));
            }
        };

        Ok(match index.entries.get(value) {
            Some(keys) => keys
                .iter()
                .filter_map(|key| self.records.get(key).cloned())
                .collect(),
            None => Vec::new(),
        })
    }

    pub(crate) fn put(&mut self, key: &str, record: Document) {
        let previous = self.records.insert(key.to_string(), record.clone());
        for index in self.indexes.values_mut() {
            if let Some(previous) = &previous {
                index.remove(key, previous);
            }
            index.add(key, &record);
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Document> {
        let previous = self.records.remove(key);
        if let Some(previous) = &previous {
            for index in self.indexes.values_mut() {
                index.remove(key, previous);
            }
        }
        previous
    }

    pub(crate) fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes.values().map(|i| i.descriptor.clone()).collect()
    }

    pub(crate) fn create_index(&mut self, descriptor: IndexDescriptor) {
        let mut index = MemoryIndex::new(descriptor);
        for (key, record) in self.records.iter() {
            index.add(key, record);
        }
        self.indexes.insert(index.descriptor.name().to_string(), index);
    }
}
