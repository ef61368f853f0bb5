//! Interned string pool.
//!
//! Every name in the container (modules, functions, fields, import aliases) and every string
//! loaded by an instruction is stored once in the pool and referred to by [`StringId`]. Interning
//! the same text twice yields the same handle.

use std::collections::HashMap;

use crate::{metadata::ids::StringId, Result};

/// Deduplicating store of the strings of one file.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<String>,
    lookup: HashMap<String, StringId>,
}

impl StringPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        StringPool::default()
    }

    /// Returns the handle of `value`, adding it to the pool if needed.
    ///
    /// # Errors
    /// [`crate::Error::NotSupported`] once the pool holds `u32::MAX` strings.
    pub fn intern(&mut self, value: &str) -> Result<StringId> {
        if let Some(id) = self.lookup.get(value) {
            return Ok(*id);
        }
        let id = next_id!(StringId, self.strings)?;
        self.strings.push(value.to_string());
        self.lookup.insert(value.to_string(), id);
        Ok(id)
    }

    /// Appends `value` without deduplication, keeping on-disk positions stable while loading.
    pub(crate) fn push_raw(&mut self, value: String) -> Result<StringId> {
        let id = next_id!(StringId, self.strings)?;
        self.lookup.entry(value.clone()).or_insert(id);
        self.strings.push(value);
        Ok(id)
    }

    /// Returns the text behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for a handle outside the pool.
    pub fn get(&self, id: StringId) -> Result<&str> {
        self.strings
            .get(id.index())
            .map(String::as_str)
            .ok_or_else(|| bad_argument!("string {} does not exist", id))
    }

    /// Looks up the handle of `value` without interning it.
    #[must_use]
    pub fn find(&self, value: &str) -> Option<StringId> {
        self.lookup.get(value).copied()
    }

    /// Number of strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterates over all strings in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (StringId, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(index, value)| (StringId::new(index as u32), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut pool = StringPool::new();
        let a = pool.intern("handle").unwrap();
        let b = pool.intern("main").unwrap();
        let c = pool.intern("handle").unwrap();

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(b).unwrap(), "main");
        assert_eq!(pool.find("main"), Some(b));
        assert!(pool.get(StringId::new(9)).is_err());
    }

    #[test]
    fn raw_push_keeps_positions() {
        let mut pool = StringPool::new();
        pool.push_raw("x".into()).unwrap();
        pool.push_raw("x".into()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.find("x"), Some(StringId::new(0)));
    }
}
