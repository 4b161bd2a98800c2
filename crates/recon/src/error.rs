use std::fmt;

use crate::model::Snapshot;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no policies, bad sheet name, etc.).
    ConfigValidation(String),
    /// A required identity column is absent from a snapshot's header row.
    MissingColumn { snapshot: Snapshot, column: String },
    /// Input table has no header row at all.
    EmptyHeader { snapshot: Snapshot },
    /// An amount, or a sum or difference of amounts, falls outside the
    /// decimal range. `snapshot` is `None` when the overflow comes from
    /// combining both snapshots.
    AmountOverflow { snapshot: Option<Snapshot> },
    /// IO error (file read, etc.).
    Io(String),
}

impl ReconError {
    /// True for input-shape errors (the table itself is unusable).
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingColumn { .. } | Self::EmptyHeader { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigParse(_) | Self::ConfigValidation(_))
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { snapshot, column } => {
                write!(f, "snapshot '{snapshot}': missing column '{column}'")
            }
            Self::EmptyHeader { snapshot } => {
                write!(f, "snapshot '{snapshot}': table has no header row")
            }
            Self::AmountOverflow { snapshot: Some(snapshot) } => {
                write!(f, "snapshot '{snapshot}': amount exceeds the supported decimal range")
            }
            Self::AmountOverflow { snapshot: None } => {
                write!(f, "comparison: amount total exceeds the supported decimal range")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
