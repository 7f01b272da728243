//! Interned-table lookups.
//!
//! A decoded package shares one string table, one dotted-name table, and
//! (generation B) one type table; every name or type elsewhere in the
//! package is an index into them. Resolution is a pure function of the
//! table and the index. An out-of-range index is a [`ResolutionError`],
//! never a default value.

use crate::ast::TypeDesc;
use crate::error::ResolutionError;

#[derive(Debug, Default)]
pub struct InternedTables {
    strings: Vec<String>,
    dotted_names: Vec<String>,
    types: Vec<TypeDesc>,
}

impl InternedTables {
    pub fn new(strings: Vec<String>, dotted_names: Vec<String>) -> Self {
        Self {
            strings,
            dotted_names,
            types: Vec::new(),
        }
    }

    pub fn with_types(mut self, types: Vec<TypeDesc>) -> Self {
        self.types = types;
        self
    }

    pub fn string(&self, index: u64) -> Result<&str, ResolutionError> {
        let index = index as usize;
        self.strings
            .get(index)
            .map(String::as_str)
            .ok_or(ResolutionError::StringIndex {
                index,
                len: self.strings.len(),
            })
    }

    pub fn dotted_name(&self, index: u64) -> Result<&str, ResolutionError> {
        let index = index as usize;
        self.dotted_names
            .get(index)
            .map(String::as_str)
            .ok_or(ResolutionError::DottedNameIndex {
                index,
                len: self.dotted_names.len(),
            })
    }

    pub fn interned_type(&self, index: u64) -> Result<&TypeDesc, ResolutionError> {
        let index = index as usize;
        self.types.get(index).ok_or(ResolutionError::TypeIndex {
            index,
            len: self.types.len(),
        })
    }
}

/// Last segment of a dotted name: `Rental.Agreement.Terms` -> `Terms`.
pub fn simple_name(dotted: &str) -> &str {
    match dotted.rfind('.') {
        Some(i) => &dotted[i + 1..],
        None => dotted,
    }
}
