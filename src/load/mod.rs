// src/load/mod.rs
use anyhow::Result;
use arrow::array::{Array, Float64Array};
use std::{collections::HashSet, path::Path};
use tracing::{debug, info};

use crate::error::DataError;
use crate::table::{IndicatorTable, GDP, INCOME, INCOME_INTERPOLATED, POPULATION, YEAR};

pub mod interpolate;
pub mod raw;
pub mod utils;

pub use interpolate::interpolate_linear;
pub use raw::RawSheet;

use utils::{header_matches, parse_number, parse_year};

/// A field the input must carry, with the headings it may appear under.
struct RequiredField {
    name: &'static str,
    aliases: &'static [&'static str],
}

const REQUIRED: [RequiredField; 4] = [
    RequiredField {
        name: YEAR,
        aliases: &["Ano"],
    },
    RequiredField {
        name: POPULATION,
        aliases: &["População Estimada"],
    },
    RequiredField {
        name: GDP,
        aliases: &["PIB Estimado (R$ em Bilhões)", "PIB Estimado"],
    },
    RequiredField {
        name: INCOME,
        aliases: &["Renda per capita"],
    },
];

impl RequiredField {
    fn matches(&self, cell: &str) -> bool {
        header_matches(cell, self.name) || self.aliases.iter().any(|a| header_matches(cell, a))
    }
}

/// Physical row index of the header plus the column of each required field.
fn locate_header(sheet: &RawSheet) -> Result<(usize, [usize; 4])> {
    let mut best: Option<(usize, &'static str)> = None;

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let cols: Vec<Option<usize>> = REQUIRED
            .iter()
            .map(|f| row.iter().position(|c| f.matches(c)))
            .collect();
        let found = cols.iter().filter(|c| c.is_some()).count();

        if found == REQUIRED.len() {
            let mut out = [0usize; 4];
            for (slot, col) in out.iter_mut().zip(&cols) {
                *slot = col.unwrap_or_default();
            }
            return Ok((row_idx, out));
        }
        if found > 0 && best.map_or(true, |(n, _)| found > n) {
            let missing = REQUIRED
                .iter()
                .zip(&cols)
                .find(|(_, c)| c.is_none())
                .map(|(f, _)| f.name)
                .unwrap_or(YEAR);
            best = Some((found, missing));
        }
    }

    let field = best.map(|(_, missing)| missing).unwrap_or(YEAR);
    Err(DataError::MissingField { field }.into())
}

/// Turn a raw sheet into the year-sorted indicator table, including the
/// interpolated income column.
#[tracing::instrument(level = "info", skip(sheet), fields(rows = sheet.rows.len()))]
pub fn load_indicator_table(sheet: &RawSheet) -> Result<IndicatorTable> {
    let (header_row, cols) = locate_header(sheet)?;
    debug!(header_row = header_row + 1, ?cols, "located header row");

    // (year, population, gdp, income)
    let mut records: Vec<(i64, [Option<f64>; 3])> = Vec::new();
    for (row_idx, row) in sheet.rows.iter().enumerate().skip(header_row + 1) {
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        let physical_row = row_idx + 1;
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

        let year_text = cell(cols[0]);
        let year = parse_year(year_text).ok_or_else(|| DataError::InvalidYear {
            row: physical_row,
            value: year_text.to_string(),
        })?;

        let mut values = [None; 3];
        for (k, slot) in values.iter_mut().enumerate() {
            let field = &REQUIRED[k + 1];
            let text = cell(cols[k + 1]);
            *slot = parse_number(text).map_err(|_| DataError::InvalidNumber {
                row: physical_row,
                field: field.name,
                value: text.to_string(),
            })?;
        }
        records.push((year, values));
    }

    records.sort_by_key(|(year, _)| *year);
    let mut seen = HashSet::with_capacity(records.len());
    for (year, _) in &records {
        if !seen.insert(*year) {
            return Err(DataError::DuplicateYear(*year).into());
        }
    }

    let years: Vec<i64> = records.iter().map(|(y, _)| *y).collect();
    let column = |k: usize| -> Float64Array { records.iter().map(|(_, v)| v[k]).collect() };
    let population = column(0);
    let gdp = column(1);
    let income = column(2);
    let income_interp = interpolate_linear(&years, &income);

    info!(
        rows = years.len(),
        first_year = years.first().copied(),
        last_year = years.last().copied(),
        income_missing = income.null_count(),
        income_filled = income.null_count() - income_interp.null_count(),
        "loaded indicator table"
    );

    IndicatorTable::new(
        years,
        vec![
            (POPULATION.to_string(), population),
            (GDP.to_string(), gdp),
            (INCOME.to_string(), income),
            (INCOME_INTERPOLATED.to_string(), income_interp),
        ],
    )
}

/// Read and load in one step.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<IndicatorTable> {
    let sheet = RawSheet::read(path)?;
    load_indicator_table(&sheet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> RawSheet {
        RawSheet::from_rows(rows.iter().map(|r| r.to_vec()))
    }

    fn data_error(err: anyhow::Error) -> DataError {
        err.downcast::<DataError>().expect("expected a DataError")
    }

    #[test]
    fn finds_header_below_a_title_row_and_sorts() -> Result<()> {
        let raw = sheet(&[
            &["Indicators 2010-2013", "", "", ""],
            &["Year", "Estimated Population", "Estimated GDP", "Per-Capita Income"],
            &["2012", "6.9", "98.0", ""],
            &["2010", "6.6", "90.0", "100"],
            &["", "", "", ""],
            &["2011", "", "94.0", ""],
            &["2013.0", "7.0", "101.5", "130"],
        ]);
        let table = load_indicator_table(&raw)?;

        assert_eq!(table.years().values().to_vec(), vec![2010, 2011, 2012, 2013]);
        assert_eq!(table.value(POPULATION, 1)?, None);
        assert_eq!(table.value(GDP, 3)?, Some(101.5));
        assert_eq!(table.column(INCOME)?.null_count(), 2);

        let interp: Vec<Option<f64>> = table.column(INCOME_INTERPOLATED)?.iter().collect();
        assert_eq!(interp, vec![Some(100.0), Some(110.0), Some(120.0), Some(130.0)]);
        Ok(())
    }

    #[test]
    fn accepts_portuguese_headings_in_any_column_order() -> Result<()> {
        let raw = sheet(&[
            &["Renda per capita", "ano", "PIB Estimado (R$ em Bilhões)", "População Estimada"],
            &["500", "2020", "120", "7.1"],
        ]);
        let table = load_indicator_table(&raw)?;
        assert_eq!(table.years().value(0), 2020);
        assert_eq!(table.value(INCOME, 0)?, Some(500.0));
        assert_eq!(table.value(POPULATION, 0)?, Some(7.1));
        Ok(())
    }

    #[test]
    fn missing_field_is_named() {
        let raw = sheet(&[
            &["Year", "Estimated Population", "Estimated GDP"],
            &["2010", "1", "2"],
        ]);
        let err = data_error(load_indicator_table(&raw).unwrap_err());
        assert!(matches!(err, DataError::MissingField { field } if field == INCOME));
    }

    #[test]
    fn non_integer_year_fails_with_row_number() {
        let raw = sheet(&[
            &["Year", "Estimated Population", "Estimated GDP", "Per-Capita Income"],
            &["2010", "1", "2", "3"],
            &["soon", "1", "2", "3"],
        ]);
        let err = data_error(load_indicator_table(&raw).unwrap_err());
        assert!(matches!(err, DataError::InvalidYear { row: 3, ref value } if value == "soon"));
    }

    #[test]
    fn blank_year_fails() {
        let raw = sheet(&[
            &["Year", "Estimated Population", "Estimated GDP", "Per-Capita Income"],
            &["", "1", "2", "3"],
        ]);
        let err = data_error(load_indicator_table(&raw).unwrap_err());
        assert!(matches!(err, DataError::InvalidYear { row: 2, .. }));
    }

    #[test]
    fn text_in_numeric_field_fails() {
        let raw = sheet(&[
            &["Year", "Estimated Population", "Estimated GDP", "Per-Capita Income"],
            &["2010", "1", "lots", "3"],
        ]);
        let err = data_error(load_indicator_table(&raw).unwrap_err());
        assert!(matches!(err, DataError::InvalidNumber { field, .. } if field == GDP));
    }

    #[test]
    fn duplicate_years_fail() {
        let raw = sheet(&[
            &["Year", "Estimated Population", "Estimated GDP", "Per-Capita Income"],
            &["2010", "1", "2", "3"],
            &["2010", "1", "2", "3"],
        ]);
        let err = data_error(load_indicator_table(&raw).unwrap_err());
        assert!(matches!(err, DataError::DuplicateYear(2010)));
    }
}
