// src/emit/mod.rs
pub mod chart;
pub mod report;
pub mod sheet;
pub mod snapshot;

pub use chart::{ChartKind, ChartSet, RenderedChart};
pub use report::{build_report, write_report, ReportInput};
pub use sheet::write_spreadsheet;
pub use snapshot::write_parquet;
