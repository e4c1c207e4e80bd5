// src/pipeline.rs
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{info, warn};

use crate::{
    calc,
    config::Config,
    emit::{self, ChartSet, ReportInput},
    load,
};

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub columns: usize,
    pub charts: usize,
    /// Chart images that could not be removed afterwards.
    pub cleanup_failures: usize,
}

/// Load → derive → spreadsheet → charts → report → chart cleanup.
///
/// Any stage failure aborts the run. Chart images are removed even when the
/// report fails to build.
#[tracing::instrument(level = "info", skip(config), fields(input = %config.input.display()))]
pub fn run(config: &Config) -> Result<RunSummary> {
    let start = Instant::now();

    // ─── 1) load + interpolate ───────────────────────────────────────
    let mut table = load::load_file(&config.input)
        .with_context(|| format!("loading {}", config.input.display()))?;

    // ─── 2) derivatives + moving averages ────────────────────────────
    calc::derive_all(&mut table)?;
    let columns = table.column_names().len();
    info!(rows = table.num_rows(), columns, "derived table");

    // ─── 3) tabular outputs ──────────────────────────────────────────
    emit::write_spreadsheet(&table, &config.output_sheet)?;
    if let Some(parquet_path) = &config.output_parquet {
        emit::write_parquet(&table, parquet_path)?;
    }

    // ─── 4) statistics, charts, report ───────────────────────────────
    let stats = calc::summarize(&table)?;
    let charts = ChartSet::render_all(&table, &config.chart_dir)?;
    let chart_count = charts.charts().len();
    let report = emit::write_report(
        &ReportInput {
            region: &config.region,
            table: &table,
            stats: &stats,
            charts: charts.charts(),
            sample_rows: config.sample_rows,
        },
        &config.report,
    );

    // ─── 5) drop transient chart images ──────────────────────────────
    let cleanup_failures = charts.cleanup();
    if cleanup_failures > 0 {
        warn!(cleanup_failures, "some chart images were left behind");
    }
    report?;

    info!(elapsed = ?start.elapsed(), "pipeline finished");
    Ok(RunSummary {
        rows: table.num_rows(),
        columns,
        charts: chart_count,
        cleanup_failures,
    })
}
