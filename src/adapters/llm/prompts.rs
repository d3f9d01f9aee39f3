//! Prompt templates for planning, evaluation and synthesis.

use crate::ports::{AIProvider, EvaluationRequest, PlanningRequest, SynthesisRequest};

const PLANNING_INSTRUCTIONS: &str = r#"You plan graph queries that gather evidence for a biomedical question.
Each step you may call tools from the catalogue below. Entity ids are not known until a resolve_* tool has returned them.
Refer to an entity you have not resolved yet by its name in quotes, or by its position among resolved entities of that class (0 is the first).

Respond with one JSON object:
{
  "thought": "what you still need and why",
  "tool_calls": [
    {"tool": "<tool name>", "args": {"<param>": <value>}, "reason": "<why>"}
  ],
  "stop": null
}
Set "stop" to "sufficient" when the evidence already answers the question, or to "no_relevant_tools" when no tool can help. Leave "tool_calls" empty in both cases."#;

const EVALUATION_INSTRUCTIONS: &str = r#"You judge whether gathered evidence is enough to answer a biomedical question.
Respond with one JSON object:
{
  "status": "SUFFICIENT" | "PARTIAL" | "INSUFFICIENT",
  "confidence": <number between 0 and 1>,
  "reasoning": "<short justification>",
  "gaps": [
    {"category": "<e.g. resolution, mechanism, evidence>", "description": "<what is missing>", "priority": <1 is most urgent>, "suggested_tool": "<tool name or null>"}
  ],
  "can_answer_now": <true|false>
}
Failed tool calls are evidence that data is missing; say so in a gap."#;

const SYNTHESIS_INSTRUCTIONS: &str = r#"You answer a biomedical question using only the evidence provided.
Cite claim or evidence ids where the evidence gives them. Say plainly when evidence is incomplete or was truncated.
Do not add facts that are not in the evidence."#;

pub fn planning_system(catalogue: &str) -> String {
    format!("{}\n\n{}", PLANNING_INSTRUCTIONS, catalogue)
}

pub fn planning_user(request: &PlanningRequest) -> String {
    format!(
        "Question: {}\n\nIteration: {}\n\nResolved entities:\n{}\n\nPrevious iterations:\n{}",
        request.query,
        request.iteration,
        request.resolved_entities,
        or_none(&request.rolling_summary),
    )
}

pub fn evaluation_system() -> &'static str {
    EVALUATION_INSTRUCTIONS
}

pub fn evaluation_user(request: &EvaluationRequest) -> String {
    format!(
        "Question: {}\n\nIteration: {}\n\nTool outputs from this iteration:\n{}\n\nPrevious iterations:\n{}",
        request.query,
        request.iteration,
        request.tool_outputs,
        or_none(&request.rolling_summary),
    )
}

pub fn synthesis_system() -> &'static str {
    SYNTHESIS_INSTRUCTIONS
}

pub fn synthesis_user(request: &SynthesisRequest) -> String {
    format!(
        "Question: {}\n\n{}",
        request.query, request.accumulated_context
    )
}

fn or_none(text: &str) -> &str {
    if text.trim().is_empty() {
        "(none)"
    } else {
        text
    }
}

/// Keeps the tail of `text` so it fits in `max_chars`, marking the cut.
///
/// Older iterations sit at the front of the rolling summary, so they go
/// first.
pub fn keep_tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let skip = count - max_chars;
    let tail: String = text.chars().skip(skip).collect();
    format!("[... {} earlier characters omitted]\n{}", skip, tail)
}

/// Characters left for variable context once `fixed` text and the
/// response reservation are accounted for.
pub fn context_char_budget(provider: &dyn AIProvider, fixed: &str, reserved_tokens: u32) -> usize {
    let info = provider.provider_info();
    let used = provider.estimate_tokens(fixed).saturating_add(reserved_tokens);
    // estimate_tokens assumes roughly four characters per token
    info.max_context_tokens.saturating_sub(used) as usize * 4
}
