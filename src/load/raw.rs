use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::{fs::File, io::BufReader, path::Path};
use tracing::debug;

use crate::error::DataError;
use crate::load::utils::clean_str;

/// The first sheet of an input spreadsheet, as cleaned text cells.
///
/// Rows keep their physical order; `rows[0]` is physical row 1. Row lengths may
/// differ.
#[derive(Debug, Default)]
pub struct RawSheet {
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<C>>,
        C: AsRef<str>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.iter().map(|c| clean_str(c.as_ref())).collect())
                .collect(),
        }
    }

    /// Read `path`, picking the reader from its extension.
    #[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let sheet = match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Self::read_workbook(path)?,
            "csv" => Self::read_csv(path)?,
            _ => return Err(DataError::UnsupportedFormat(ext).into()),
        };
        debug!(rows = sheet.rows.len(), "read raw sheet");
        Ok(sheet)
    }

    fn read_workbook(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {:?}", path))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(DataError::NoWorksheet)?
            .with_context(|| format!("Failed to read first worksheet of {:?}", path))?;

        // calamine ranges start at the first used cell; pad so row indices stay physical
        let (top, left) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); top as usize];
        for row in range.rows() {
            let mut cells = vec![String::new(); left as usize];
            cells.extend(row.iter().map(|c| c.to_string()));
            rows.push(cells);
        }
        Ok(Self::from_rows(rows))
    }

    fn read_csv(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result
                .with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        Ok(Self::from_rows(rows))
    }
}
