use std::collections::{HashMap, HashSet};

use crate::config::MatchPolicy;
use crate::key::EntityKey;
use crate::model::{AggregatedRecord, AggregatedTable};

/// A past record together with every in-scope current record of the same entity.
#[derive(Debug)]
pub struct EntityMatch<'a> {
    pub past: &'a AggregatedRecord,
    /// Current records in current-table order; empty when the entity is gone.
    pub current: Vec<&'a AggregatedRecord>,
}

#[derive(Debug)]
pub struct EntityMatchOutput<'a> {
    /// One entry per in-scope past record, in past-table order.
    pub past: Vec<EntityMatch<'a>>,
    /// In-scope current records whose entity has no in-scope past record.
    pub current_only: Vec<&'a AggregatedRecord>,
}

/// Records of `table` the policy covers, in table order.
pub fn in_scope<'a>(table: &'a AggregatedTable, policy: &MatchPolicy) -> Vec<&'a AggregatedRecord> {
    let prefix = policy.scope();
    table.records.iter().filter(|r| r.account.starts_with(prefix)).collect()
}

/// Pair past and current records by entity within the policy's scope.
pub fn match_entities<'a>(
    past: &'a AggregatedTable,
    current: &'a AggregatedTable,
    policy: &MatchPolicy,
) -> EntityMatchOutput<'a> {
    let past_scoped = in_scope(past, policy);
    let current_scoped = in_scope(current, policy);

    let mut current_by_entity: HashMap<&EntityKey, Vec<&AggregatedRecord>> = HashMap::new();
    for record in current_scoped.iter().copied() {
        current_by_entity.entry(&record.entity).or_default().push(record);
    }

    let past_entities: HashSet<&EntityKey> = past_scoped.iter().map(|r| &r.entity).collect();

    let matched = past_scoped
        .iter()
        .map(|p| EntityMatch {
            past: *p,
            current: current_by_entity.get(&p.entity).cloned().unwrap_or_default(),
        })
        .collect();

    let current_only = current_scoped
        .into_iter()
        .filter(|c| !past_entities.contains(&c.entity))
        .collect();

    EntityMatchOutput {
        past: matched,
        current_only,
    }
}
