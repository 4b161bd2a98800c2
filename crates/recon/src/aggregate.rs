use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::amount::coerce_amount;
use crate::config::ColumnMapping;
use crate::error::ReconError;
use crate::key::{AccountKey, EntityKey};
use crate::model::{AggregatedRecord, AggregatedTable, RawRecord, RawTable, Snapshot};

/// Header positions resolved once per table.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    case_id: usize,
    claimant_id: usize,
    claimant_name: usize,
    major: usize,
    sub_account: usize,
    amount: Option<usize>,
}

impl ColumnIndex {
    fn resolve(
        snapshot: Snapshot,
        table: &RawTable,
        columns: &ColumnMapping,
    ) -> Result<Self, ReconError> {
        if table.headers.is_empty() {
            return Err(ReconError::EmptyHeader { snapshot });
        }

        let idx = |name: &str| -> Result<usize, ReconError> {
            table.column_index(name).ok_or_else(|| ReconError::MissingColumn {
                snapshot,
                column: name.into(),
            })
        };

        let [case_id, claimant_id, claimant_name, major, sub_account] = columns.required();
        Ok(Self {
            case_id: idx(case_id)?,
            claimant_id: idx(claimant_id)?,
            claimant_name: idx(claimant_name)?,
            major: idx(major)?,
            sub_account: idx(sub_account)?,
            // A missing amount column means every amount is zero.
            amount: table.column_index(&columns.amount),
        })
    }
}

/// Rows of a raw table as typed records, plus the number of amount cells
/// that were replaced by zero.
pub fn read_records(
    snapshot: Snapshot,
    table: &RawTable,
    columns: &ColumnMapping,
) -> Result<(Vec<RawRecord>, usize), ReconError> {
    let index = ColumnIndex::resolve(snapshot, table, columns)?;
    if index.amount.is_none() {
        debug!(%snapshot, column = %columns.amount, "amount column absent; amounts read as zero");
    }

    let mut coerced = 0;
    let mut records = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let cell = |col: usize| table.cell(row, col).to_string();

        let amount = match index.amount {
            Some(col) => {
                let c = coerce_amount(table.cell(row, col))
                    .map_err(|_| ReconError::AmountOverflow { snapshot: Some(snapshot) })?;
                if c.substituted {
                    coerced += 1;
                }
                c.value
            }
            None => Decimal::ZERO,
        };

        records.push(RawRecord {
            case_id: cell(index.case_id),
            claimant_id: cell(index.claimant_id),
            claimant_name: cell(index.claimant_name),
            major: cell(index.major),
            sub_account: cell(index.sub_account),
            amount,
        });
    }

    Ok((records, coerced))
}

/// Group records by (entity, account) and sum amounts. Output is ordered by key.
pub fn aggregate_records(
    snapshot: Snapshot,
    records: &[RawRecord],
    separator: &str,
) -> Result<Vec<AggregatedRecord>, ReconError> {
    let mut groups: BTreeMap<(EntityKey, AccountKey), Decimal> = BTreeMap::new();

    for record in records {
        let key = (record.entity_key(separator), record.account_key(separator));
        let total = groups.entry(key).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(record.amount)
            .ok_or(ReconError::AmountOverflow { snapshot: Some(snapshot) })?;
    }

    Ok(groups
        .into_iter()
        .map(|((entity, account), amount)| AggregatedRecord { entity, account, amount })
        .collect())
}

/// Build the aggregated table for one snapshot.
pub fn normalize(
    snapshot: Snapshot,
    table: &RawTable,
    columns: &ColumnMapping,
    separator: &str,
) -> Result<AggregatedTable, ReconError> {
    let (records, coerced_amounts) = read_records(snapshot, table, columns)?;
    let aggregated = aggregate_records(snapshot, &records, separator)?;

    debug!(
        %snapshot,
        raw_rows = records.len(),
        aggregated = aggregated.len(),
        coerced_amounts,
        "normalized snapshot"
    );

    Ok(AggregatedTable {
        snapshot,
        records: aggregated,
        raw_rows: records.len(),
        coerced_amounts,
    })
}
