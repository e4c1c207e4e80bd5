pub mod calc;
pub mod config;
pub mod emit;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod table;

pub use config::Config;
pub use error::{ArtifactWriteError, DataError};
pub use pipeline::{run, RunSummary};
pub use table::IndicatorTable;
