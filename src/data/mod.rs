//! Data storage and training set construction
//!
//! SQLite game store, JSON import, and the builder that turns stored games
//! into training rows.

pub mod database;
pub mod dataset;
pub mod import;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use database::{Database, DatabaseStats};
pub use dataset::{train_test_split_by_season, DatasetSummary, TrainingDataBuilder, TrainingSet};
pub use import::{import_file, ImportFile, ImportSummary};
pub use store::{DateOrder, GameQuery, GameStore};
