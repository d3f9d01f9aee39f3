//! Stratified sampling of list payloads.

use serde_json::Value;
use std::collections::HashMap;

use crate::domain::tools::Record;

/// Attributes tried, in order, as the grouping key of a list.
pub const GROUP_KEYS: [&str; 5] = ["source_id", "drug_id", "gene_id", "disease_id", "subject_id"];

/// Rows kept from a longer list.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Selected rows in their original order.
    pub rows: Vec<Record>,
    /// Length of the list before sampling.
    pub total: usize,
}

impl Sample {
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total
    }

    /// The "N of M shown" annotation, present only when rows were dropped.
    pub fn annotation(&self) -> Option<String> {
        self.is_truncated()
            .then(|| format!("{} of {} shown", self.rows.len(), self.total))
    }
}

/// First grouping attribute present in every row.
pub fn grouping_key(rows: &[Record]) -> Option<&'static str> {
    GROUP_KEYS
        .iter()
        .copied()
        .find(|key| rows.iter().all(|r| r.get(*key).is_some_and(|v| !v.is_null())))
}

/// Keeps at most `max` rows.
///
/// When rows share a grouping attribute with more than one distinct
/// value, every group gets `max / groups` slots (at least one) in order
/// of first appearance; leftover slots are filled from the remaining rows
/// in original order. Otherwise the list is truncated.
pub fn stratified_sample(rows: &[Record], max: usize) -> Sample {
    let total = rows.len();
    if total <= max {
        return Sample {
            rows: rows.to_vec(),
            total,
        };
    }

    let groups = grouping_key(rows).map(|key| group_indices(rows, key));
    let selected: Vec<usize> = match groups {
        Some(groups) if groups.len() > 1 => {
            let per_group = (max / groups.len()).max(1);
            let mut chosen = vec![false; total];
            let mut taken = 0;

            'groups: for members in &groups {
                for &i in members.iter().take(per_group) {
                    if taken == max {
                        break 'groups;
                    }
                    chosen[i] = true;
                    taken += 1;
                }
            }
            for flag in chosen.iter_mut() {
                if taken == max {
                    break;
                }
                if !*flag {
                    *flag = true;
                    taken += 1;
                }
            }
            chosen
                .iter()
                .enumerate()
                .filter_map(|(i, c)| c.then_some(i))
                .collect()
        }
        _ => (0..max).collect(),
    };

    Sample {
        rows: selected.into_iter().map(|i| rows[i].clone()).collect(),
        total,
    }
}

/// Row indices per distinct key value, groups in first-appearance order.
fn group_indices(rows: &[Record], key: &str) -> Vec<Vec<usize>> {
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let value = row.get(key).map(group_label).unwrap_or_default();
        let slot = *order.entry(value).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

fn group_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn ids(sample: &Sample) -> Vec<i64> {
        sample
            .rows
            .iter()
            .filter_map(|r| r.get("n").and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn short_lists_are_kept_whole() {
        let input = rows(vec![json!({"n": 1}), json!({"n": 2})]);
        let sample = stratified_sample(&input, 10);
        assert_eq!(sample.rows.len(), 2);
        assert_eq!(sample.annotation(), None);
    }

    #[test]
    fn ungrouped_lists_are_truncated() {
        let input = rows((0..100).map(|n| json!({"n": n})).collect());
        let sample = stratified_sample(&input, 10);
        assert_eq!(ids(&sample), (0..10).collect::<Vec<_>>());
        assert_eq!(sample.annotation().as_deref(), Some("10 of 100 shown"));
    }

    #[test]
    fn single_group_falls_back_to_truncation() {
        let input = rows((0..20).map(|n| json!({"n": n, "drug_id": 7})).collect());
        let sample = stratified_sample(&input, 5);
        assert_eq!(ids(&sample), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn groups_get_fair_share() {
        // 18 rows of drug 1 followed by 2 rows of drug 2
        let mut values: Vec<Value> = (0..18).map(|n| json!({"n": n, "drug_id": 1})).collect();
        values.extend((18..20).map(|n| json!({"n": n, "drug_id": 2})));
        let sample = stratified_sample(&rows(values), 6);

        // 3 slots each; drug 2 only has 2 rows, leftover slot goes to drug 1
        assert_eq!(ids(&sample), vec![0, 1, 2, 3, 18, 19]);
        assert_eq!(sample.annotation().as_deref(), Some("6 of 20 shown"));
    }

    #[test]
    fn more_groups_than_slots_stays_within_bound() {
        let input = rows((0..30).map(|n| json!({"n": n, "gene_id": n})).collect());
        let sample = stratified_sample(&input, 4);
        assert_eq!(sample.rows.len(), 4);
        assert_eq!(ids(&sample), vec![0, 1, 2, 3]);
    }

    #[test]
    fn grouping_key_requires_presence_in_every_row() {
        let input = rows(vec![
            json!({"drug_id": 1, "gene_id": 2}),
            json!({"gene_id": 3}),
        ]);
        assert_eq!(grouping_key(&input), Some("gene_id"));
    }
}
