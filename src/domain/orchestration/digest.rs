//! Compact per-iteration digest appended to the rolling summary.

use super::IterationRecord;

/// Renders Thought / Action / Tool outputs / Observation for one iteration.
pub fn iteration_digest(record: &IterationRecord) -> String {
    let mut lines = vec![format!("[Iteration {}]", record.number)];

    if let Some(thought) = record.plan.thought.as_deref().filter(|t| !t.trim().is_empty()) {
        lines.push(format!("Thought: {}", thought.trim()));
    }

    let actions: Vec<String> = record.plan.calls.iter().map(|c| c.to_string()).collect();
    lines.push(format!(
        "Action: {}",
        if actions.is_empty() {
            "(none)".to_string()
        } else {
            actions.join("; ")
        }
    ));

    if !record.executions.is_empty() {
        let outputs: Vec<String> = record.executions.iter().map(|r| r.status_line()).collect();
        lines.push(format!("Tool outputs: {}", outputs.join("; ")));
    }

    if let Some(evaluation) = &record.evaluation {
        lines.push(format!("Observation: {}", evaluation.observation()));
    }

    lines.join("\n")
}
