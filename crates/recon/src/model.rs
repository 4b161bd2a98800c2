use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::MatchPolicy;
use crate::key::{AccountKey, EntityKey};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which side of the reconciliation a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Snapshot {
    Past,
    Current,
}

impl Snapshot {
    /// Sheet name of this snapshot's aggregated table in the report.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Past => "PASADO",
            Self::Current => "ACTUAL",
        }
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Past => write!(f, "past"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// A loaded input table: header row plus data rows, every cell as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of the first header equal to `name` (surrounding whitespace ignored).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cell text, or "" for short rows.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One input row after schema resolution and amount coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub case_id: String,
    pub claimant_id: String,
    pub claimant_name: String,
    pub major: String,
    pub sub_account: String,
    pub amount: Decimal,
}

impl RawRecord {
    pub fn entity_key(&self, separator: &str) -> EntityKey {
        EntityKey::new(&self.case_id, &self.claimant_id, &self.claimant_name, separator)
    }

    pub fn account_key(&self, separator: &str) -> AccountKey {
        AccountKey::new(&self.major, &self.sub_account, separator)
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Total amount for one (entity, account) pair within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecord {
    pub entity: EntityKey,
    pub account: AccountKey,
    pub amount: Decimal,
}

/// All aggregated records of one snapshot, in ascending (entity, account) order.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedTable {
    pub snapshot: Snapshot,
    pub records: Vec<AggregatedRecord>,
    /// Data rows read from the raw table.
    pub raw_rows: usize,
    /// Non-blank amount cells that failed to parse and were summed as zero.
    pub coerced_amounts: usize,
}

impl AggregatedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all amounts; `None` when it exceeds the decimal range.
    pub fn total(&self) -> Option<Decimal> {
        self.records
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.amount))
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    SameAccount,
    DifferentAccount,
    OnlyInPast,
    OnlyInCurrent,
}

impl Disposition {
    pub const ALL: [Disposition; 4] = [
        Self::SameAccount,
        Self::DifferentAccount,
        Self::OnlyInPast,
        Self::OnlyInCurrent,
    ];

    /// Label written to the `Resultado` column of the report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SameAccount => "Misma cuenta",
            Self::DifferentAccount => "Cuenta diferente",
            Self::OnlyInPast => "Solo en pasado",
            Self::OnlyInCurrent => "Solo en actual",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SameAccount => write!(f, "same_account"),
            Self::DifferentAccount => write!(f, "different_account"),
            Self::OnlyInPast => write!(f, "only_in_past"),
            Self::OnlyInCurrent => write!(f, "only_in_current"),
        }
    }
}

/// One line of a comparison table.
///
/// `account_past` / `account_current` hold either an account key, the
/// none marker, or (for [`Disposition::DifferentAccount`]) a comma-joined list
/// of every account the entity has in the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub entity: EntityKey,
    pub account_past: String,
    pub account_current: String,
    pub amount_past: Decimal,
    pub amount_current: Decimal,
    /// `amount_current - amount_past`; absent when accounts differ.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
    pub disposition: Disposition,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total_rows: usize,
    pub same_account: usize,
    pub different_account: usize,
    pub only_in_past: usize,
    pub only_in_current: usize,
    /// Same-account rows whose amount moved.
    pub changed: usize,
    pub total_past: Decimal,
    pub total_current: Decimal,
    /// Sum of every difference that is present.
    pub net_difference: Decimal,
}

impl ComparisonSummary {
    pub fn count(&self, disposition: Disposition) -> usize {
        match disposition {
            Disposition::SameAccount => self.same_account,
            Disposition::DifferentAccount => self.different_account,
            Disposition::OnlyInPast => self.only_in_past,
            Disposition::OnlyInCurrent => self.only_in_current,
        }
    }
}

/// Output of one matching policy.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonTable {
    pub name: String,
    pub policy: MatchPolicy,
    pub summary: ComparisonSummary,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub past: AggregatedTable,
    pub current: AggregatedTable,
    pub comparisons: Vec<ComparisonTable>,
}

impl ReconResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}
