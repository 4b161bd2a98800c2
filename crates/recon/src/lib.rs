//! `oa2-recon`: past/current case-expense reconciliation engine.
//!
//! Pure engine crate: receives loaded tables, returns aggregated snapshots
//! and classified comparison tables. No CLI or file-format dependencies.

pub mod aggregate;
pub mod amount;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod matcher;
pub mod model;
pub mod summary;

pub use aggregate::normalize;
pub use config::{ColumnMapping, MatchPolicy, ReconConfig};
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use key::{AccountKey, EntityKey};
pub use model::{
    AggregatedRecord, AggregatedTable, ComparisonRow, ComparisonTable, Disposition, RawTable,
    ReconResult, Snapshot,
};
