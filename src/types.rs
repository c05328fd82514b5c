//! Core data model: a [`Schema`] of typed [`Field`]s plus row-major [`Value`] storage.
//!
//! A column is either [`DataType::Numeric`] or [`DataType::Categorical`]; the kind is fixed
//! per column, never per cell. Both kinds can hold missing values.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{CleanlyError, CleanlyResult};

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 64-bit floating point numbers.
    Numeric,
    /// Opaque UTF-8 text tokens.
    Categorical,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Shorthand for a [`DataType::Numeric`] field.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Numeric)
    }

    /// Shorthand for a [`DataType::Categorical`] field.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Categorical)
    }
}

/// Ordered list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Like [`Self::index_of`], but fails with [`CleanlyError::UnknownColumn`].
    pub fn require(&self, name: &str) -> CleanlyResult<usize> {
        self.index_of(name)
            .ok_or_else(|| CleanlyError::unknown_column(name))
    }

    /// Indexes of all columns of the given type, in schema order.
    pub fn indices_of_type(&self, data_type: DataType) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.data_type == data_type)
            .map(|(i, _)| i)
            .collect()
    }

    /// Fails with [`CleanlyError::DuplicateColumn`] if a name appears twice.
    pub fn validate(&self) -> CleanlyResult<()> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CleanlyError::DuplicateColumn {
                    column: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A single cell in a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    Null,
    /// Numeric value. `NaN` is treated as missing.
    Number(f64),
    /// Categorical value.
    Text(String),
}

impl Value {
    /// `true` for [`Value::Null`] and for `Number(NaN)`.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(v) => v.is_nan(),
            Value::Text(_) => false,
        }
    }

    /// The number held by this cell, unless it is missing or not numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// The text held by this cell, unless it is missing or not categorical.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this cell may live in a column of `data_type`.
    pub fn fits(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (Value::Null, _)
                | (Value::Number(_), DataType::Numeric)
                | (Value::Text(_), DataType::Categorical)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(v) if v.is_nan() => Ok(()),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A named column of values, used to build a [`DataSet`] column-wise.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column definition.
    pub field: Field,
    /// Column values, top to bottom.
    pub values: Vec<Value>,
}

impl Column {
    /// Numeric column; `None` is missing.
    pub fn numeric<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        Self {
            field: Field::numeric(name),
            values: values.into_iter().map(Value::from).collect(),
        }
    }

    /// Categorical column; `None` is missing.
    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            field: Field::categorical(name),
            values: values
                .into_iter()
                .map(|v| v.map(|s| Value::Text(s.into())).unwrap_or(Value::Null))
                .collect(),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows without validation.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Create a dataset, checking name uniqueness, row arity and cell types.
    pub fn try_new(schema: Schema, rows: Vec<Vec<Value>>) -> CleanlyResult<Self> {
        let ds = Self::new(schema, rows);
        ds.validate()?;
        Ok(ds)
    }

    /// Build a dataset from equally long columns.
    pub fn from_columns(columns: Vec<Column>) -> CleanlyResult<Self> {
        let height = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != height) {
            return Err(CleanlyError::SchemaMismatch {
                message: format!(
                    "column '{}' has {} values, expected {height}",
                    bad.field.name,
                    bad.values.len()
                ),
            });
        }

        let schema = Schema::new(columns.iter().map(|c| c.field.clone()).collect());
        let mut rows: Vec<Vec<Value>> = (0..height)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();
        for column in columns {
            for (row, value) in rows.iter_mut().zip(column.values) {
                row.push(value);
            }
        }
        Self::try_new(schema, rows)
    }

    /// Check the invariants enforced by [`Self::try_new`].
    pub fn validate(&self) -> CleanlyResult<()> {
        self.schema.validate()?;
        let width = self.schema.fields.len();
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != width {
                return Err(CleanlyError::SchemaMismatch {
                    message: format!("row {i} has {} values, schema has {width}", row.len()),
                });
            }
            for (field, value) in self.schema.fields.iter().zip(row) {
                if !value.fits(field.data_type) {
                    return Err(CleanlyError::SchemaMismatch {
                        message: format!(
                            "row {i} column '{}': {value:?} is not {:?}",
                            field.name, field.data_type
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Iterate the cells of column `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Cells of a column looked up by name.
    pub fn column_by_name(&self, name: &str) -> CleanlyResult<Vec<Value>> {
        let idx = self.schema.require(name)?;
        Ok(self.column(idx).cloned().collect())
    }

    /// Non-missing numbers of column `idx`, top to bottom.
    pub fn numbers(&self, idx: usize) -> Vec<f64> {
        self.column(idx).filter_map(Value::as_number).collect()
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Create a new dataset with `schema`, applying `mapper` to every row.
    ///
    /// # Panics
    ///
    /// Panics if `mapper` returns a row with a different length than the schema field count.
    pub fn map_rows_into<F>(&self, schema: Schema, mut mapper: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value>,
    {
        let expected_len = schema.fields.len();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let out = mapper(row.as_slice());
                assert!(
                    out.len() == expected_len,
                    "mapped row length {} does not match schema length {}",
                    out.len(),
                    expected_len
                );
                out
            })
            .collect();

        Self { schema, rows }
    }

    /// Create a new dataset by applying `mapper` to every row, keeping the schema.
    ///
    /// # Panics
    ///
    /// Panics if `mapper` returns a row with a different length than the schema field count.
    pub fn map_rows<F>(&self, mapper: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value>,
    {
        self.map_rows_into(self.schema.clone(), mapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> DataSet {
        DataSet::from_columns(vec![
            Column::numeric("id", [Some(1.0), Some(2.0), Some(3.0)]),
            Column::categorical("name", [Some("a"), None, Some("c")]),
        ])
        .unwrap()
    }

    #[test]
    fn schema_index_of_works() {
        let ds = sample_dataset();
        assert_eq!(ds.schema.index_of("id"), Some(0));
        assert_eq!(ds.schema.index_of("name"), Some(1));
        assert_eq!(ds.schema.index_of("missing"), None);
        assert!(matches!(
            ds.schema.require("missing"),
            Err(CleanlyError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn from_columns_lays_out_rows() {
        let ds = sample_dataset();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.rows[1], vec![Value::Number(2.0), Value::Null]);
    }

    #[test]
    fn from_columns_rejects_ragged_columns() {
        let err = DataSet::from_columns(vec![
            Column::numeric("a", [Some(1.0)]),
            Column::numeric("b", [Some(1.0), Some(2.0)]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("column 'b' has 2 values"));
    }

    #[test]
    fn try_new_rejects_duplicate_names_and_wrong_types() {
        let schema = Schema::new(vec![Field::numeric("a"), Field::numeric("a")]);
        assert!(matches!(
            DataSet::try_new(schema, vec![]),
            Err(CleanlyError::DuplicateColumn { .. })
        ));

        let schema = Schema::new(vec![Field::numeric("a")]);
        let err = DataSet::try_new(schema, vec![vec![Value::from("x")]]).unwrap_err();
        assert!(matches!(err, CleanlyError::SchemaMismatch { .. }));
    }

    #[test]
    fn nan_counts_as_missing() {
        assert!(Value::Number(f64::NAN).is_missing());
        assert!(Value::Null.is_missing());
        assert!(!Value::Number(0.0).is_missing());
        assert_eq!(Value::Number(f64::NAN).as_number(), None);
        assert_eq!(Value::Number(f64::NAN).to_string(), "");
    }

    #[test]
    fn filter_rows_preserves_schema_and_input() {
        let ds = sample_dataset();
        let out = ds.filter_rows(|row| matches!(row[0].as_number(), Some(v) if v > 1.0));
        assert_eq!(out.schema, ds.schema);
        assert_eq!(out.row_count(), 2);
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    #[should_panic(expected = "mapped row length")]
    fn map_rows_panics_if_mapper_returns_wrong_arity() {
        let ds = sample_dataset();
        let _ = ds.map_rows(|_row| vec![Value::Null]);
    }
}
