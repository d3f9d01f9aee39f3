//! Provenance ledger: which call touched which evidence.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::domain::tools::Record;

const EVIDENCE_KEYS: [&str; 2] = ["evidence_id", "evidence_ids"];
const CLAIM_KEYS: [&str; 2] = ["claim_id", "claim_ids"];
const DATASET_KEYS: [&str; 3] = ["dataset", "dataset_id", "source"];

/// Provenance identifiers touched by one tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProvenanceEntry {
    /// Position of the call within the session.
    pub call_sequence: usize,
    pub tool: String,
    pub evidence_ids: BTreeSet<String>,
    pub claim_ids: BTreeSet<String>,
    pub dataset_ids: BTreeSet<String>,
}

impl ProvenanceEntry {
    /// Collects identifiers from a call's rows.
    pub fn from_rows(call_sequence: usize, tool: impl Into<String>, rows: &[Record]) -> Self {
        let mut entry = Self {
            call_sequence,
            tool: tool.into(),
            ..Self::default()
        };
        for row in rows {
            collect(row, &EVIDENCE_KEYS, &mut entry.evidence_ids);
            collect(row, &CLAIM_KEYS, &mut entry.claim_ids);
            collect(row, &DATASET_KEYS, &mut entry.dataset_ids);
        }
        entry
    }

    pub fn is_empty(&self) -> bool {
        self.evidence_ids.is_empty() && self.claim_ids.is_empty() && self.dataset_ids.is_empty()
    }
}

fn collect(row: &Record, keys: &[&str], into: &mut BTreeSet<String>) {
    for key in keys {
        match row.get(*key) {
            Some(Value::Array(items)) => into.extend(items.iter().filter_map(scalar_id)),
            Some(value) => into.extend(scalar_id(value)),
            None => {}
        }
    }
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Per-call provenance, in call order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProvenanceLedger {
    entries: Vec<ProvenanceEntry>,
}

/// Session-wide union of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProvenanceSummary {
    pub calls_with_provenance: usize,
    pub evidence_ids: BTreeSet<String>,
    pub claim_ids: BTreeSet<String>,
    pub dataset_ids: BTreeSet<String>,
}

impl ProvenanceLedger {
    pub fn record(&mut self, entry: ProvenanceEntry) {
        if !entry.is_empty() {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[ProvenanceEntry] {
        &self.entries
    }

    pub fn summary(&self) -> ProvenanceSummary {
        let mut summary = ProvenanceSummary {
            calls_with_provenance: self.entries.len(),
            ..ProvenanceSummary::default()
        };
        for entry in &self.entries {
            summary.evidence_ids.extend(entry.evidence_ids.iter().cloned());
            summary.claim_ids.extend(entry.claim_ids.iter().cloned());
            summary.dataset_ids.extend(entry.dataset_ids.iter().cloned());
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Record {
        match value {
            Value::Object(m) => m,
            _ => Record::new(),
        }
    }

    #[test]
    fn entry_collects_scalars_and_lists() {
        let rows = vec![
            row(json!({"claim_id": 5, "dataset": "faers", "evidence_ids": ["e1", "e2"]})),
            row(json!({"claim_id": 6, "dataset": "faers"})),
        ];
        let entry = ProvenanceEntry::from_rows(0, "drug_adverse_events", &rows);

        assert_eq!(entry.claim_ids, BTreeSet::from(["5".to_string(), "6".to_string()]));
        assert_eq!(entry.dataset_ids.len(), 1);
        assert_eq!(entry.evidence_ids.len(), 2);
    }

    #[test]
    fn ledger_keeps_per_call_attribution() {
        let mut ledger = ProvenanceLedger::default();
        ledger.record(ProvenanceEntry::from_rows(0, "a", &[row(json!({"claim_id": 1}))]));
        ledger.record(ProvenanceEntry::from_rows(1, "b", &[row(json!({"claim_id": 1}))]));
        ledger.record(ProvenanceEntry::from_rows(2, "c", &[row(json!({"name": "x"}))]));

        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.entries()[1].tool, "b");

        let summary = ledger.summary();
        assert_eq!(summary.calls_with_provenance, 2);
        assert_eq!(summary.claim_ids.len(), 1);
    }
}
