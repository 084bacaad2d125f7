//! Data module - dataset download, cleaning, and queries

mod fetch;
mod prepare;
mod table;

pub use fetch::{DatasetFetcher, FetchError, DATA_URL};
pub use prepare::{prepare_from_csv_bytes, DropStats, PrepareError};
pub use table::{PreparedTable, SeriesPoint, SnapshotRow};
