// src/table.rs

use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Int64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::error::DataError;

pub const YEAR: &str = "Year";
pub const POPULATION: &str = "Estimated Population";
pub const GDP: &str = "Estimated GDP";
pub const INCOME: &str = "Per-Capita Income";
pub const INCOME_INTERPOLATED: &str = "Per-Capita Income (Interpolated)";

/// Year-indexed table of nullable indicator columns.
///
/// Column 0 is always `Year` (Int64, non-null, ascending, unique). Every other
/// column is a nullable Float64; a null is a missing or undefined value.
/// Columns can only be appended, never removed or reordered.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    batch: RecordBatch,
}

impl IndicatorTable {
    /// Build a table from a year vector and named value columns, in order.
    pub fn new(years: Vec<i64>, columns: Vec<(String, Float64Array)>) -> Result<Self> {
        let mut fields = Vec::with_capacity(columns.len() + 1);
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len() + 1);
        let rows = years.len();

        fields.push(Field::new(YEAR, DataType::Int64, false));
        arrays.push(Arc::new(Int64Array::from(years)));

        for (name, values) in columns {
            if fields.iter().any(|f| f.name() == &name) {
                return Err(DataError::DuplicateColumn(name).into());
            }
            if values.len() != rows {
                return Err(DataError::LengthMismatch {
                    name,
                    expected: rows,
                    found: values.len(),
                }
                .into());
            }
            fields.push(Field::new(&name, DataType::Float64, true));
            arrays.push(Arc::new(values));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .context("building indicator table")?;
        Ok(Self { batch })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn years(&self) -> &Int64Array {
        // `new` always puts the non-null Int64 year column first
        self.batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("column 0 is always the Int64 year column")
    }

    /// Look up a value column by name.
    pub fn column(&self, name: &str) -> Result<&Float64Array> {
        self.batch
            .column_by_name(name)
            .and_then(|arr| arr.as_any().downcast_ref::<Float64Array>())
            .ok_or_else(|| DataError::UnknownColumn(name.to_string()).into())
    }

    /// All column names, `Year` first, in insertion order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Append a derived column at the end of the table.
    pub fn append_column(&mut self, name: &str, values: Float64Array) -> Result<()> {
        let schema = self.batch.schema();
        if schema.column_with_name(name).is_some() {
            return Err(DataError::DuplicateColumn(name.to_string()).into());
        }
        if values.len() != self.num_rows() {
            return Err(DataError::LengthMismatch {
                name: name.to_string(),
                expected: self.num_rows(),
                found: values.len(),
            }
            .into());
        }

        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        fields.push(Field::new(name, DataType::Float64, true));
        let mut cols = self.batch.columns().to_vec();
        cols.push(Arc::new(values) as ArrayRef);

        self.batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), cols)
            .with_context(|| format!("appending column {name:?}"))?;
        Ok(())
    }

    /// First `n` rows (or fewer), sharing the underlying buffers.
    pub fn head(&self, n: usize) -> IndicatorTable {
        IndicatorTable {
            batch: self.batch.slice(0, n.min(self.num_rows())),
        }
    }

    /// Value at `row` of a value column, `None` when missing.
    pub fn value(&self, name: &str, row: usize) -> Result<Option<f64>> {
        Ok(value_at(self.column(name)?, row))
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}

/// Null-aware element access.
pub fn value_at(values: &Float64Array, i: usize) -> Option<f64> {
    values.is_valid(i).then(|| values.value(i))
}
