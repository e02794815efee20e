//! A small keyed store that refuses silent overwrites.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{DataError, DataResult};

/// Map wrapper whose `add` never replaces and whose `update`/`delete` require the key.
#[derive(Debug, Clone)]
pub struct SimpleStore<K, V> {
    items: HashMap<K, V>,
}

impl<K, V> Default for SimpleStore<K, V> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<K, V> SimpleStore<K, V>
where
    K: Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`; fails if the key is already present.
    pub fn add(&mut self, key: K, value: V) -> DataResult<()> {
        if self.items.contains_key(&key) {
            return Err(DataError::KeyExists {
                key: format!("{key:?}"),
            });
        }
        self.items.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &K) -> DataResult<&V> {
        self.items.get(key).ok_or_else(|| not_found(key))
    }

    /// Replace the value stored under `key`; fails if the key is absent.
    pub fn update(&mut self, key: K, value: V) -> DataResult<()> {
        match self.items.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(not_found(&key)),
        }
    }

    /// Remove `key` and return its value; fails if the key is absent.
    pub fn delete(&mut self, key: &K) -> DataResult<V> {
        self.items.remove(key).ok_or_else(|| not_found(key))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn not_found<K: Debug>(key: &K) -> DataError {
    DataError::KeyNotFound {
        key: format!("{key:?}"),
    }
}
