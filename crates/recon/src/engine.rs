use tracing::{debug, trace};

use crate::aggregate::normalize;
use crate::classify::classify;
use crate::config::{MatchPolicy, ReconConfig};
use crate::error::ReconError;
use crate::matcher::match_entities;
use crate::model::{
    AggregatedTable, ComparisonRow, ComparisonTable, RawTable, ReconMeta, ReconResult, Snapshot,
};
use crate::summary::compute_summary;

/// Run reconciliation per config. Returns aggregated tables, one classified
/// comparison table per policy, and run metadata.
///
/// All or nothing: a schema error in either snapshot aborts the run before
/// any comparison is built.
pub fn run(config: &ReconConfig, past: &RawTable, current: &RawTable) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let past = normalize(Snapshot::Past, past, &config.columns, &config.separator)?;
    let current = normalize(Snapshot::Current, current, &config.columns, &config.separator)?;

    let comparisons = reconcile_tables(&config.policies, &past, &current)?;

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        past,
        current,
        comparisons,
    })
}

/// Build one comparison table per policy, in policy order.
pub fn reconcile_tables(
    policies: &[MatchPolicy],
    past: &AggregatedTable,
    current: &AggregatedTable,
) -> Result<Vec<ComparisonTable>, ReconError> {
    policies
        .iter()
        .map(|policy| {
            let rows = reconcile(past, current, policy)?;
            let summary = compute_summary(&rows)?;
            debug!(
                %policy,
                rows = summary.total_rows,
                same_account = summary.same_account,
                different_account = summary.different_account,
                only_in_past = summary.only_in_past,
                only_in_current = summary.only_in_current,
                "reconciled policy"
            );
            Ok(ComparisonTable {
                name: policy.sheet_name(),
                policy: policy.clone(),
                summary,
                rows,
            })
        })
        .collect()
}

/// Compare two aggregated snapshots under one policy.
///
/// Fails only when an amount total or difference leaves the decimal range.
pub fn reconcile(
    past: &AggregatedTable,
    current: &AggregatedTable,
    policy: &MatchPolicy,
) -> Result<Vec<ComparisonRow>, ReconError> {
    let output = match_entities(past, current, policy);
    trace!(
        %policy,
        past_in_scope = output.past.len(),
        current_only = output.current_only.len(),
        "matched entities"
    );
    classify(&output)
}
