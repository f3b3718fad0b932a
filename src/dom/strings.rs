//! String Interning Pool
//!
//! Deduplicated storage for element names, attribute names and PI targets.
//! Text content is mutable and lives on the nodes themselves; only names,
//! which repeat heavily and rarely change, go through the pool.

use std::collections::HashMap;

/// String interning pool
///
/// ID 0 is reserved for "no string" and resolves to the empty string.
#[derive(Debug, Clone)]
pub struct StringPool {
    /// Strings indexed by ID
    entries: Vec<Box<str>>,
    /// Content -> ID
    index: HashMap<Box<str>, u32>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            index: HashMap::with_capacity(64),
        };
        pool.entries.push(Box::from(""));
        pool
    }

    /// Intern a string, returning its ID
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.entries.len() as u32;
        self.entries.push(Box::from(s));
        self.index.insert(Box::from(s), id);
        id
    }

    /// Look up an already interned string without adding it
    #[inline]
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.index.get(s).copied()
    }

    /// Resolve a string ID
    #[inline]
    pub fn get_str(&self, id: u32) -> Option<&str> {
        self.entries.get(id as usize).map(|s| s.as_ref())
    }

    /// Number of interned strings (including the reserved empty entry)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing but the reserved entry is stored
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }
}
