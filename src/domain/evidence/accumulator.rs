//! Evidence Accumulator - bounded context built from tool results.
//!
//! Results are folded in call order. Rows are deduplicated per tool, so
//! a repeated call adds nothing, and every list longer than the per-tool
//! budget is stratified-sampled when rendered.

use serde_json::Value;
use std::collections::HashSet;

use crate::domain::tools::{Payload, Record, ToolResult};

use super::provenance::{ProvenanceEntry, ProvenanceLedger, ProvenanceSummary};
use super::sampling::stratified_sample;

/// Rows and failures gathered for one tool.
#[derive(Debug, Clone, Default)]
struct ToolSection {
    tool: String,
    calls: usize,
    rows: Vec<Record>,
    seen: HashSet<String>,
    failures: Vec<String>,
}

impl ToolSection {
    fn add_rows(&mut self, rows: Vec<Record>) -> usize {
        let mut added = 0;
        for row in rows {
            let fingerprint = Value::Object(row.clone()).to_string();
            if self.seen.insert(fingerprint) {
                self.rows.push(row);
                added += 1;
            }
        }
        added
    }
}

/// Size-bounded, deduplicating fold of tool results.
#[derive(Debug, Clone, Default)]
pub struct EvidenceAccumulator {
    sections: Vec<ToolSection>,
    provenance: ProvenanceLedger,
    folded: usize,
}

impl EvidenceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one result. Never fails; failures are kept as text.
    pub fn fold(&mut self, result: &ToolResult) {
        let sequence = self.folded;
        self.folded += 1;

        let tool = result.tool.name().to_string();
        let index = match self.sections.iter().position(|s| s.tool == tool) {
            Some(i) => i,
            None => {
                self.sections.push(ToolSection {
                    tool: tool.clone(),
                    ..ToolSection::default()
                });
                self.sections.len() - 1
            }
        };
        let section = &mut self.sections[index];
        section.calls += 1;

        if !result.success {
            section.failures.push(result.status_line());
            return;
        }

        let rows = match result.payload.clone() {
            Some(Payload::List(rows)) => rows,
            Some(Payload::Record(record)) => vec![record],
            Some(Payload::Empty) | None => Vec::new(),
        };
        self.provenance
            .record(ProvenanceEntry::from_rows(sequence, tool, &rows));
        section.add_rows(rows);
    }

    /// Number of results folded so far.
    pub fn len(&self) -> usize {
        self.folded
    }

    pub fn is_empty(&self) -> bool {
        self.folded == 0
    }

    /// Distinct rows held for a tool.
    pub fn row_count(&self, tool: &str) -> usize {
        self.sections
            .iter()
            .find(|s| s.tool == tool)
            .map(|s| s.rows.len())
            .unwrap_or(0)
    }

    pub fn provenance(&self) -> &ProvenanceLedger {
        &self.provenance
    }

    pub fn provenance_summary(&self) -> ProvenanceSummary {
        self.provenance.summary()
    }

    /// Renders the evidence, at most `max_items_per_tool` rows per tool.
    ///
    /// Sampled sections carry an `[N of M shown]` annotation.
    pub fn to_context(&self, max_items_per_tool: usize) -> String {
        if self.sections.is_empty() {
            return "(no evidence gathered)".to_string();
        }

        let mut out = Vec::new();
        for section in &self.sections {
            let calls = if section.calls == 1 { "call" } else { "calls" };
            out.push(format!("## {} ({} {})", section.tool, section.calls, calls));

            if !section.rows.is_empty() {
                let sample = stratified_sample(&section.rows, max_items_per_tool);
                if let Some(note) = sample.annotation() {
                    out.push(format!("[{}]", note));
                }
                for row in &sample.rows {
                    out.push(format!("- {}", Value::Object(row.clone())));
                }
            } else if section.failures.is_empty() {
                out.push("(no rows)".to_string());
            }

            for failure in &section.failures {
                out.push(format!("! {}", failure));
            }
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::{PlannedTool, ToolArgs, ToolFailureKind, ToolId};
    use serde_json::json;

    fn list_result(tool: ToolId, rows: Value) -> ToolResult {
        ToolResult::succeeded(tool.into(), ToolArgs::new(), Payload::from_json(rows))
    }

    fn item_lines(context: &str) -> usize {
        context.lines().filter(|l| l.starts_with("- ")).count()
    }

    #[test]
    fn empty_accumulator_says_so() {
        assert_eq!(EvidenceAccumulator::new().to_context(10), "(no evidence gathered)");
    }

    #[test]
    fn hundred_rows_are_bounded_and_annotated() {
        let rows: Vec<Value> = (0..100).map(|n| json!({"adverse_event_id": n})).collect();
        let mut acc = EvidenceAccumulator::new();
        acc.fold(&list_result(ToolId::DrugAdverseEvents, Value::Array(rows)));

        let context = acc.to_context(10);
        assert_eq!(item_lines(&context), 10);
        assert!(context.contains("10 of 100 shown"));
    }

    #[test]
    fn repeated_rows_are_deduplicated() {
        let mut acc = EvidenceAccumulator::new();
        let result = list_result(ToolId::DrugTargets, json!([{"gene_id": 1}, {"gene_id": 2}]));
        acc.fold(&result);
        acc.fold(&result);

        assert_eq!(acc.len(), 2);
        assert_eq!(acc.row_count("drug_targets"), 2);
        assert!(acc.to_context(10).contains("## drug_targets (2 calls)"));
    }

    #[test]
    fn failures_are_rendered_not_raised() {
        let mut acc = EvidenceAccumulator::new();
        acc.fold(&ToolResult::failed(
            PlannedTool::Unknown("frobnicate".into()),
            ToolArgs::new(),
            ToolFailureKind::UnknownTool,
            "unknown tool",
        ));

        let context = acc.to_context(10);
        assert!(context.contains("! frobnicate() -> FAILED: unknown tool"));
    }

    #[test]
    fn provenance_is_attributed_per_call() {
        let mut acc = EvidenceAccumulator::new();
        acc.fold(&list_result(ToolId::DrugTargets, json!([{"claim_id": 1}])));
        acc.fold(&list_result(ToolId::GeneDiseases, json!([{"claim_id": 1}, {"claim_id": 2}])));

        let entries = acc.provenance().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tool, "drug_targets");
        assert_eq!(entries[1].call_sequence, 1);
        assert_eq!(acc.provenance_summary().claim_ids.len(), 2);
    }

    #[test]
    fn empty_payload_renders_placeholder() {
        let mut acc = EvidenceAccumulator::new();
        acc.fold(&ToolResult::succeeded(
            ToolId::ResolveDrugs.into(),
            ToolArgs::new(),
            Payload::Empty,
        ));
        assert!(acc.to_context(10).contains("(no rows)"));
    }
}
