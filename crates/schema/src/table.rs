//! Column and table types with merge/diff

use std::collections::{BTreeSet, HashMap, hash_map};
use std::sync::OnceLock;

use en_typing::{DataType, common_ancestor, is_convertible};
use thiserror::Error;

/// Schema evolution errors
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Existing column cannot absorb the incoming type
    #[error("unsupported column '{column}' type change from {from} to {to}")]
    IncompatibleTypeChange {
        column: String,
        from: DataType,
        to: DataType,
    },
}

/// A column with its observed data types
///
/// The effective type is the common ancestor of every type occurrence,
/// resolved lazily and memoized until a merge adds a new occurrence.
#[derive(Debug, Clone)]
pub struct Column {
    data_type: OnceLock<DataType>,
    type_occurrence: BTreeSet<DataType>,
}

impl Column {
    /// Create a column that has been observed with a single type
    pub fn new(data_type: DataType) -> Self {
        let memo = OnceLock::new();
        let _ = memo.set(data_type);
        Self {
            data_type: memo,
            type_occurrence: BTreeSet::from([data_type]),
        }
    }

    /// Create a column from a set of observed types (memo unresolved)
    pub fn from_types(types: impl IntoIterator<Item = DataType>) -> Self {
        Self {
            data_type: OnceLock::new(),
            type_occurrence: types.into_iter().collect(),
        }
    }

    /// Resolve the effective column type
    ///
    /// Folds [`common_ancestor`] over the occurrence set and memoizes the
    /// result; the memo is wiped whenever a merge adds a new occurrence.
    /// An empty occurrence set is a bug in the caller and resolves to
    /// `UNKNOWN` without memoizing.
    pub fn get_type(&self) -> DataType {
        if let Some(t) = self.data_type.get() {
            return *t;
        }
        if self.type_occurrence.is_empty() {
            tracing::error!("system error: column type occurrence set is empty");
            return DataType::Unknown;
        }
        *self.data_type.get_or_init(|| {
            self.type_occurrence
                .iter()
                .copied()
                .reduce(common_ancestor)
                .unwrap_or(DataType::Unknown)
        })
    }

    /// Observed type occurrences
    pub fn type_occurrence(&self) -> &BTreeSet<DataType> {
        &self.type_occurrence
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        // the memo is derived state
        self.type_occurrence == other.type_occurrence
    }
}

impl Eq for Column {}

/// Named column set (keys unique, order irrelevant)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns(HashMap<String, Column>);

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        self.0.insert(name.into(), column);
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Column> {
        self.0.iter()
    }

    /// Column names, for drivers that need a header row
    pub fn header(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Add all columns from `other` into this set
    ///
    /// Absent columns are inserted; present columns union their occurrence
    /// sets, and any new occurrence wipes the memoized type so the next
    /// [`Column::get_type`] re-resolves it.
    pub fn merge(&mut self, other: &Columns) {
        for (name, other_column) in other.iter() {
            match self.0.get_mut(name) {
                Some(current) => {
                    let mut changed = false;
                    for t in &other_column.type_occurrence {
                        if current.type_occurrence.insert(*t) {
                            changed = true;
                        }
                    }
                    if changed {
                        current.data_type = OnceLock::new();
                    }
                }
                None => {
                    self.0.insert(name.clone(), other_column.clone());
                }
            }
        }
    }
}

impl FromIterator<(String, Column)> for Columns {
    fn from_iter<T: IntoIterator<Item = (String, Column)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A destination table: columns plus an optional primary key
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Columns,
    pub pk_fields: Option<Vec<String>>,
    pub version: i64,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True if the table carries any schema at all
    pub fn exists(&self) -> bool {
        !self.columns.is_empty() || self.pk_fields.is_some()
    }

    /// Compute the additions needed to make this table a superset of `other`
    ///
    /// Columns are strictly additive: a column present in both must satisfy
    /// `is_convertible(incoming, current)` — widening only — or the diff
    /// fails with [`SchemaError::IncompatibleTypeChange`]. Primary keys use
    /// replace semantics: if the sorted field lists differ, the diff carries
    /// `other`'s pk_fields; otherwise the diff's pk_fields stays `None`.
    pub fn diff(&self, other: &Table) -> Result<Table, SchemaError> {
        let mut diff = Table::new(self.name.clone());

        if other.columns.is_empty() {
            return Ok(diff);
        }

        for (name, column) in other.columns.iter() {
            match self.columns.get(name) {
                Some(current) => {
                    if !is_convertible(column.get_type(), current.get_type()) {
                        return Err(SchemaError::IncompatibleTypeChange {
                            column: name.clone(),
                            from: column.get_type(),
                            to: current.get_type(),
                        });
                    }
                }
                None => diff.columns.insert(name.clone(), column.clone()),
            }
        }

        if !pk_fields_equal(self.pk_fields.as_deref(), other.pk_fields.as_deref()) {
            diff.pk_fields = other.pk_fields.clone();
        }

        Ok(diff)
    }
}

/// Order-insensitive primary key comparison; absent compares equal to empty
fn pk_fields_equal(current: Option<&[String]>, incoming: Option<&[String]>) -> bool {
    let mut current: Vec<&String> = current.unwrap_or_default().iter().collect();
    let mut incoming: Vec<&String> = incoming.unwrap_or_default().iter().collect();
    if current.len() != incoming.len() {
        return false;
    }
    current.sort();
    incoming.sort();
    current == incoming
}

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
