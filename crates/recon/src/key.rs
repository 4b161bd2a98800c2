//! Composite identity keys.
//!
//! Both keys are opaque text built by joining their components with a
//! separator. The join is not reversible: a component that itself contains
//! the separator can collide with a different split of the same text
//! (`"A-B" + "C"` and `"A" + "B-C"` both render as `A-B-C`). Keys are never
//! parsed back, so this only matters for collisions, which are kept as-is to
//! stay compatible with reports produced by earlier runs.

use std::fmt;

use serde::Serialize;

/// Separator used by the report format when none is configured.
pub const DEFAULT_SEPARATOR: &str = "-";

/// Account placeholder for rows that exist on only one side.
pub const NONE_MARKER: &str = "-";

/// Case + claimant identity (`datounico` in the report).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(case_id: &str, claimant_id: &str, claimant_name: &str, separator: &str) -> Self {
        Self([case_id, claimant_id, claimant_name].join(separator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger account identity: major code + sub-account code (`cuenta`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn new(major: &str, sub_account: &str, separator: &str) -> Self {
        Self([major, sub_account].join(separator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Textual prefix test. The empty prefix matches every account.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
