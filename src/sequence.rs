//! Keyed Sequences
//!
//! Ordered collections that can be indexed by position or looked up by a key
//! carried on each item. Unlike a map, keys need not be unique: keyed lookup
//! returns the first item in sequence order.

use crate::error::EndpointError;
use std::sync::Arc;

/// Items that expose the attribute a [`KeyedSequence`] is keyed by.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl<T: Keyed + ?Sized> Keyed for Arc<T> {
    fn key(&self) -> &str {
        (**self).key()
    }
}

/// Ordered sequence with positional and keyed lookup.
#[derive(Debug, Clone)]
pub struct KeyedSequence<T> {
    items: Vec<T>,
}

impl<T> Default for KeyedSequence<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> KeyedSequence<T> {
    /// Build a sequence, preserving the iteration order of `items`.
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Item at `index`.
    pub fn get(&self, index: usize) -> Result<&T, EndpointError> {
        self.items.get(index).ok_or(EndpointError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// First item whose key equals `key`.
    pub fn get_by_key(&self, key: &str) -> Result<&T, EndpointError> {
        self.items
            .iter()
            .find(|item| item.key() == key)
            .ok_or_else(|| EndpointError::NotFound(key.to_string()))
    }

    /// Keys of all items in sequence order. May contain duplicates.
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key()).collect()
    }

    /// Plain ordered copy of the items.
    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.clone()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a KeyedSequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
