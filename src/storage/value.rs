// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Column values and the deltas built from them.

/// Index of a column within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(pub u16);

impl ColumnId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A column value stored in a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Value(pub Vec<u8>);

impl Value {
    /// Creates a new value from bytes.
    #[inline]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the value bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the value.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Value {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A partial row: values for a subset of a tuple's columns.
///
/// Writes carry the new values as a delta; the undo record of that write keeps
/// the same columns' prior values as its before-image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    columns: Vec<(ColumnId, Value)>,
}

impl Delta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column value, replacing any earlier value for the same column.
    pub fn with(mut self, column: ColumnId, value: impl Into<Value>) -> Self {
        self.set(column, value.into());
        self
    }

    /// Sets a column value, replacing any earlier value for the same column.
    pub fn set(&mut self, column: ColumnId, value: Value) {
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Returns the value recorded for `column`.
    pub fn get(&self, column: ColumnId) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    /// Returns the number of columns in the delta.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the delta touches no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over the columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &Value)> {
        self.columns.iter().map(|(c, v)| (*c, v))
    }

    /// Overwrites the matching entries of `row` with this delta's values.
    pub(crate) fn apply_to(&self, row: &mut [Value]) {
        for (column, value) in &self.columns {
            row[column.index()] = value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from_str() {
        let value = Value::from("hello");
        assert_eq!(value.as_bytes(), b"hello");
        assert_eq!(value.len(), 5);
        assert!(!value.is_empty());
    }

    #[test]
    fn test_delta_set_replaces() {
        let delta = Delta::new()
            .with(ColumnId(0), "a")
            .with(ColumnId(2), "c")
            .with(ColumnId(0), "b");

        assert_eq!(delta.num_columns(), 2);
        assert_eq!(delta.get(ColumnId(0)), Some(&Value::from("b")));
        assert_eq!(delta.get(ColumnId(1)), None);
    }

    #[test]
    fn test_delta_apply_to_row() {
        let mut row = vec![Value::from("x"), Value::from("y"), Value::from("z")];
        Delta::new()
            .with(ColumnId(1), "Y")
            .with(ColumnId(2), "Z")
            .apply_to(&mut row);

        assert_eq!(row, vec![Value::from("x"), Value::from("Y"), Value::from("Z")]);
    }
}
