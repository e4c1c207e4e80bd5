// src/calc/mod.rs
use anyhow::Result;
use arrow::array::Array;
use tracing::debug;

use crate::table::{IndicatorTable, GDP, INCOME, INCOME_INTERPOLATED, POPULATION};

pub mod derivative;
pub mod dispersion;
pub mod smoothing;

pub use derivative::{derivatives, first_difference, Derivatives};
pub use dispersion::{dispersion, Dispersion};
pub use smoothing::{moving_average, moving_averages};

/// A series that gets velocity, acceleration and moving averages.
#[derive(Debug, Clone, Copy)]
pub struct TrackedSeries {
    pub column: &'static str,
    /// Periods between consecutive samples.
    pub step: f64,
}

/// Population is collected biennially in places, hence the step of 2.
pub const TRACKED: [TrackedSeries; 3] = [
    TrackedSeries {
        column: POPULATION,
        step: 2.0,
    },
    TrackedSeries {
        column: GDP,
        step: 1.0,
    },
    TrackedSeries {
        column: INCOME_INTERPOLATED,
        step: 1.0,
    },
];

pub const WINDOWS: [usize; 2] = [3, 7];

/// Columns summarised in the statistics table, in display order.
pub const DISPERSION_COLUMNS: [&str; 4] = [POPULATION, GDP, INCOME, INCOME_INTERPOLATED];

pub fn velocity_column(series: &str) -> String {
    format!("{series} Velocity")
}

pub fn acceleration_column(series: &str) -> String {
    format!("{series} Acceleration")
}

pub fn moving_average_column(series: &str, window: usize) -> String {
    format!("{series} MA_{window}")
}

/// Append velocity/acceleration for `column` with time step `step`.
pub fn append_derivatives(table: &mut IndicatorTable, column: &str, step: f64) -> Result<()> {
    let d = derivatives(table.column(column)?, step);
    debug!(
        column,
        step,
        defined = d.velocity.len() - d.velocity.null_count(),
        "computed derivatives"
    );
    table.append_column(&velocity_column(column), d.velocity)?;
    table.append_column(&acceleration_column(column), d.acceleration)?;
    Ok(())
}

/// Append one moving-average column per window for `column`.
pub fn append_moving_averages(
    table: &mut IndicatorTable,
    column: &str,
    windows: &[usize],
) -> Result<()> {
    let averages = moving_averages(table.column(column)?, windows);
    for (window, values) in averages {
        table.append_column(&moving_average_column(column, window), values)?;
    }
    debug!(column, ?windows, "computed moving averages");
    Ok(())
}

/// Run every derivation stage over the tracked series: all derivative pairs
/// first, then all moving averages.
#[tracing::instrument(level = "info", skip(table), fields(rows = table.num_rows()))]
pub fn derive_all(table: &mut IndicatorTable) -> Result<()> {
    for series in &TRACKED {
        append_derivatives(table, series.column, series.step)?;
    }
    for series in &TRACKED {
        append_moving_averages(table, series.column, &WINDOWS)?;
    }
    Ok(())
}

/// Dispersion of each summarised column, labelled by column name.
pub fn summarize(table: &IndicatorTable) -> Result<Vec<(&'static str, Dispersion)>> {
    DISPERSION_COLUMNS
        .iter()
        .map(|&name| Ok((name, dispersion(table.column(name)?))))
        .collect()
}
