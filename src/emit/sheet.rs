use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

use crate::error::ArtifactWriteError;
use crate::table::{value_at, IndicatorTable};

pub const SHEET_NAME: &str = "Analysis";

/// Write every column of `table` to a single-sheet workbook at `path`,
/// replacing any existing file. Missing values are left as empty cells.
#[tracing::instrument(level = "info", skip(table, path), fields(path = %path.as_ref().display()))]
pub fn write_spreadsheet<P: AsRef<Path>>(table: &IndicatorTable, path: P) -> Result<()> {
    let path = path.as_ref();
    build_workbook(table, path)
        .map_err(|e| ArtifactWriteError::new("spreadsheet", path, e))?;
    info!(
        rows = table.num_rows(),
        columns = table.column_names().len(),
        "wrote spreadsheet {}",
        path.display()
    );
    Ok(())
}

fn build_workbook(table: &IndicatorTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let names = table.column_names();
    for (c, name) in names.iter().enumerate() {
        let col = u16::try_from(c).context("too many columns for a worksheet")?;
        worksheet.write_string_with_format(0, col, name.as_str(), &bold)?;
        worksheet.set_column_width(col, (name.chars().count() + 2).max(10) as f64)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    let years = table.years();
    for r in 0..table.num_rows() {
        let row = u32::try_from(r + 1).context("too many rows for a worksheet")?;
        worksheet.write_number(row, 0, years.value(r) as f64)?;
        for (c, name) in names.iter().enumerate().skip(1) {
            if let Some(v) = value_at(table.column(name)?, r) {
                worksheet.write_number(row, c as u16, v)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("saving workbook {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::RawSheet;
    use arrow::array::Float64Array;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_the_loader_reader() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.xlsx");
        let table = IndicatorTable::new(
            vec![2010, 2011],
            vec![
                ("A".to_string(), Float64Array::from(vec![Some(1.5), None])),
                ("B".to_string(), Float64Array::from(vec![None, Some(-2.0)])),
            ],
        )?;

        // an existing file is replaced
        std::fs::write(&path, b"stale")?;
        write_spreadsheet(&table, &path)?;

        let sheet = RawSheet::read(&path)?;
        assert_eq!(sheet.rows[0], vec!["Year", "A", "B"]);
        assert_eq!(sheet.rows[1], vec!["2010", "1.5", ""]);
        assert_eq!(sheet.rows[2], vec!["2011", "", "-2"]);
        Ok(())
    }

    #[test]
    fn unwritable_path_is_an_artifact_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing-dir").join("out.xlsx");
        let table = IndicatorTable::new(vec![2010], vec![])?;
        let err = write_spreadsheet(&table, &path).unwrap_err();
        let artifact = err
            .downcast_ref::<ArtifactWriteError>()
            .expect("expected an ArtifactWriteError");
        assert_eq!(artifact.kind, "spreadsheet");
        assert_eq!(artifact.path, path);
        Ok(())
    }
}
