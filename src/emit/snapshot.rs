use anyhow::{Context, Result};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{fs::File, path::Path};
use tracing::info;

use crate::error::ArtifactWriteError;
use crate::table::IndicatorTable;

/// Columnar snapshot of the augmented table as a single Snappy-compressed
/// Parquet file.
#[tracing::instrument(level = "info", skip(table, path), fields(path = %path.as_ref().display()))]
pub fn write_parquet<P: AsRef<Path>>(table: &IndicatorTable, path: P) -> Result<()> {
    let path = path.as_ref();
    write_batch(table, path).map_err(|e| ArtifactWriteError::new("parquet snapshot", path, e))?;
    info!(rows = table.num_rows(), "wrote parquet {}", path.display());
    Ok(())
}

fn write_batch(table: &IndicatorTable, path: &Path) -> Result<()> {
    let batch = table.batch();
    let file = File::create(path).with_context(|| format!("creating parquet file {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for indicator table")?;
    writer.write(batch).context("writing indicator batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn snapshot_preserves_nulls_and_schema() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("table.parquet");
        let table = IndicatorTable::new(
            vec![2010, 2011, 2012],
            vec![(
                "Value".to_string(),
                Float64Array::from(vec![Some(1.0), None, Some(3.0)]),
            )],
        )?;
        write_parquet(&table, &path)?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        let names: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, table.column_names());
        assert_eq!(batch.column(1).null_count(), 1);
        Ok(())
    }
}
