//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `fs_store`: JSON artifact files bound by a SHA-256 manifest
//! - `csv_dataset`: CSV training data via the `csv` crate

mod csv_dataset;
mod fs_store;

pub use csv_dataset::CsvDataset;
pub use fs_store::FsArtifactStore;
