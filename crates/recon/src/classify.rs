use rust_decimal::Decimal;

use crate::error::ReconError;
use crate::key::NONE_MARKER;
use crate::matcher::{EntityMatch, EntityMatchOutput};
use crate::model::{AggregatedRecord, ComparisonRow, Disposition, Snapshot};

/// Classify matched entities into comparison rows.
///
/// Rows derived from past records come first (past-table order), followed
/// by current-only rows (current-table order).
pub fn classify(output: &EntityMatchOutput<'_>) -> Result<Vec<ComparisonRow>, ReconError> {
    let mut rows = Vec::with_capacity(output.past.len() + output.current_only.len());
    for m in &output.past {
        rows.push(classify_past(m)?);
    }
    rows.extend(output.current_only.iter().map(|c| classify_current_only(c)));
    Ok(rows)
}

/// Disposition of one past record against the entity's current records.
pub fn classify_past(m: &EntityMatch<'_>) -> Result<ComparisonRow, ReconError> {
    let p = m.past;

    if m.current.is_empty() {
        return Ok(ComparisonRow {
            entity: p.entity.clone(),
            account_past: p.account.to_string(),
            account_current: NONE_MARKER.into(),
            amount_past: p.amount,
            amount_current: Decimal::ZERO,
            difference: Some(-p.amount),
            disposition: Disposition::OnlyInPast,
        });
    }

    let same: Vec<&AggregatedRecord> = m
        .current
        .iter()
        .copied()
        .filter(|c| c.account == p.account)
        .collect();

    if !same.is_empty() {
        // Aggregation leaves at most one record per account; summing keeps
        // the row correct if a caller hands in unaggregated records.
        let amount_current = current_total(&same)?;
        let difference = amount_current
            .checked_sub(p.amount)
            .ok_or(ReconError::AmountOverflow { snapshot: None })?;
        return Ok(ComparisonRow {
            entity: p.entity.clone(),
            account_past: p.account.to_string(),
            account_current: p.account.to_string(),
            amount_past: p.amount,
            amount_current,
            difference: Some(difference),
            disposition: Disposition::SameAccount,
        });
    }

    Ok(ComparisonRow {
        entity: p.entity.clone(),
        account_past: p.account.to_string(),
        account_current: distinct_accounts(&m.current),
        amount_past: p.amount,
        amount_current: current_total(&m.current)?,
        difference: None,
        disposition: Disposition::DifferentAccount,
    })
}

pub fn classify_current_only(c: &AggregatedRecord) -> ComparisonRow {
    ComparisonRow {
        entity: c.entity.clone(),
        account_past: NONE_MARKER.into(),
        account_current: c.account.to_string(),
        amount_past: Decimal::ZERO,
        amount_current: c.amount,
        difference: Some(c.amount),
        disposition: Disposition::OnlyInCurrent,
    }
}

fn current_total(records: &[&AggregatedRecord]) -> Result<Decimal, ReconError> {
    records
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.amount))
        .ok_or(ReconError::AmountOverflow { snapshot: Some(Snapshot::Current) })
}

/// Accounts in first-seen order, de-duplicated, joined with ", ".
fn distinct_accounts(records: &[&AggregatedRecord]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for r in records {
        let account = r.account.as_str();
        if !seen.contains(&account) {
            seen.push(account);
        }
    }
    seen.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{AccountKey, EntityKey};

    fn rec(entity: &str, account: &str, amount: i64) -> AggregatedRecord {
        let (major, sub) = account.split_once('-').unwrap();
        AggregatedRecord {
            entity: EntityKey::new(entity, "D", "N", "-"),
            account: AccountKey::new(major, sub, "-"),
            amount: Decimal::from(amount),
        }
    }

    #[test]
    fn only_in_past() {
        let p = rec("C1", "1202-01", 200);
        let row = classify_past(&EntityMatch { past: &p, current: vec![] }).unwrap();
        assert_eq!(row.disposition, Disposition::OnlyInPast);
        assert_eq!(row.account_current, "-");
        assert_eq!(row.amount_current, Decimal::ZERO);
        assert_eq!(row.difference, Some(Decimal::from(-200)));
    }

    #[test]
    fn same_account_difference() {
        let p = rec("C1", "1202-01", 100);
        let c = rec("C1", "1202-01", 150);
        let row = classify_past(&EntityMatch { past: &p, current: vec![&c] }).unwrap();
        assert_eq!(row.disposition, Disposition::SameAccount);
        assert_eq!(row.account_current, "1202-01");
        assert_eq!(row.amount_current, Decimal::from(150));
        assert_eq!(row.difference, Some(Decimal::from(50)));
    }

    #[test]
    fn same_account_ignores_other_accounts_of_entity() {
        let p = rec("C1", "1202-01", 100);
        let c1 = rec("C1", "1202-01", 90);
        let c2 = rec("C1", "1202-02", 1000);
        let row = classify_past(&EntityMatch { past: &p, current: vec![&c1, &c2] }).unwrap();
        assert_eq!(row.disposition, Disposition::SameAccount);
        assert_eq!(row.amount_current, Decimal::from(90));
        assert_eq!(row.difference, Some(Decimal::from(-10)));
    }

    #[test]
    fn same_account_sums_residual_duplicates() {
        let p = rec("C1", "1202-01", 10);
        let c1 = rec("C1", "1202-01", 4);
        let c2 = rec("C1", "1202-01", 6);
        let row = classify_past(&EntityMatch { past: &p, current: vec![&c1, &c2] }).unwrap();
        assert_eq!(row.amount_current, Decimal::from(10));
        assert_eq!(row.difference, Some(Decimal::ZERO));
    }

    #[test]
    fn zero_amounts_are_still_same_account() {
        let p = rec("C1", "1202-01", 0);
        let c = rec("C1", "1202-01", 0);
        let row = classify_past(&EntityMatch { past: &p, current: vec![&c] }).unwrap();
        assert_eq!(row.disposition, Disposition::SameAccount);
        assert_eq!(row.difference, Some(Decimal::ZERO));
    }

    #[test]
    fn different_account_lists_every_current_account() {
        let p = rec("C1", "1202-01", 100);
        let c1 = rec("C1", "1202-03", 30);
        let c2 = rec("C1", "1202-05", 20);
        let row = classify_past(&EntityMatch { past: &p, current: vec![&c1, &c2, &c1] }).unwrap();
        assert_eq!(row.disposition, Disposition::DifferentAccount);
        assert_eq!(row.account_current, "1202-03, 1202-05");
        assert_eq!(row.amount_current, Decimal::from(80));
        assert_eq!(row.difference, None);
    }

    #[test]
    fn current_only() {
        let c = rec("C9", "2401-01", 75);
        let row = classify_current_only(&c);
        assert_eq!(row.disposition, Disposition::OnlyInCurrent);
        assert_eq!(row.account_past, "-");
        assert_eq!(row.amount_past, Decimal::ZERO);
        assert_eq!(row.difference, Some(Decimal::from(75)));
    }

    #[test]
    fn past_rows_precede_current_only_rows() {
        let p = rec("C2", "1202-01", 1);
        let c = rec("C1", "1202-01", 1);
        let output = EntityMatchOutput {
            past: vec![EntityMatch { past: &p, current: vec![] }],
            current_only: vec![&c],
        };
        let rows = classify(&output).unwrap();
        assert_eq!(rows[0].disposition, Disposition::OnlyInPast);
        assert_eq!(rows[1].disposition, Disposition::OnlyInCurrent);
    }

    #[test]
    fn difference_beyond_decimal_range_is_an_error() {
        let mut p = rec("C1", "1202-01", 0);
        let mut c = rec("C1", "1202-01", 0);
        p.amount = -Decimal::MAX;
        c.amount = Decimal::MAX;
        let err = classify_past(&EntityMatch { past: &p, current: vec![&c] }).unwrap_err();
        assert!(matches!(err, ReconError::AmountOverflow { snapshot: None }));
    }

    #[test]
    fn current_total_beyond_decimal_range_is_an_error() {
        let p = rec("C1", "1202-01", 1);
        let mut c1 = rec("C1", "1202-03", 0);
        let mut c2 = rec("C1", "1202-05", 0);
        c1.amount = Decimal::MAX;
        c2.amount = Decimal::MAX;
        let err = classify_past(&EntityMatch { past: &p, current: vec![&c1, &c2] }).unwrap_err();
        assert!(matches!(err, ReconError::AmountOverflow { snapshot: Some(Snapshot::Current) }));
    }
}
