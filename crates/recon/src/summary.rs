use rust_decimal::Decimal;

use crate::error::ReconError;
use crate::model::{ComparisonRow, ComparisonSummary, Disposition};

/// Compute summary statistics for one comparison table.
pub fn compute_summary(rows: &[ComparisonRow]) -> Result<ComparisonSummary, ReconError> {
    let mut summary = ComparisonSummary {
        total_rows: rows.len(),
        ..Default::default()
    };

    for r in rows {
        match r.disposition {
            Disposition::SameAccount => {
                summary.same_account += 1;
                if r.difference.is_some_and(|d| !d.is_zero()) {
                    summary.changed += 1;
                }
            }
            Disposition::DifferentAccount => summary.different_account += 1,
            Disposition::OnlyInPast => summary.only_in_past += 1,
            Disposition::OnlyInCurrent => summary.only_in_current += 1,
        }

        summary.total_past = add(summary.total_past, r.amount_past)?;
        summary.total_current = add(summary.total_current, r.amount_current)?;
        summary.net_difference = add(summary.net_difference, r.difference.unwrap_or(Decimal::ZERO))?;
    }

    Ok(summary)
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal, ReconError> {
    a.checked_add(b).ok_or(ReconError::AmountOverflow { snapshot: None })
}
