//! Owned string arrays drained from a reply cursor.

use crate::wire::{ArgCursor, ArgType};

/// Owned, ordered list of strings read from a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringArray {
    items: Vec<String>,
}

impl StringArray {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }

    /// `None` for an empty array.
    ///
    /// Every fetch path reports a zero-length array as an absent value, never
    /// as an empty-but-present one.
    pub fn non_empty(self) -> Option<Self> {
        if self.items.is_empty() { None } else { Some(self) }
    }
}

impl From<Vec<String>> for StringArray {
    fn from(items: Vec<String>) -> Self {
        Self { items }
    }
}

impl IntoIterator for StringArray {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Drain the leading run of string and object-path entries from `cursor`.
///
/// Reading stops at the first entry of any other type, or at the end of the
/// sequence. The cursor is left on the entry that stopped the read.
pub fn read_string_array(cursor: &mut ArgCursor<'_>) -> StringArray {
    let mut items = Vec::new();
    while matches!(cursor.arg_type(), ArgType::Str | ArgType::ObjectPath) {
        if let Some(value) = cursor.get_str() {
            items.push(value.to_owned());
        }
        cursor.advance();
    }
    StringArray { items }
}
