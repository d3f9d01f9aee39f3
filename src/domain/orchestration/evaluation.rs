//! Sufficiency evaluation value objects.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;
use crate::domain::tools::ToolId;

/// Verdict on the evidence gathered so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SufficiencyStatus {
    Sufficient,
    Partial,
    Insufficient,
}

impl FromStr for SufficiencyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUFFICIENT" => Ok(Self::Sufficient),
            "PARTIAL" => Ok(Self::Partial),
            "INSUFFICIENT" => Ok(Self::Insufficient),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("expected SUFFICIENT, PARTIAL or INSUFFICIENT, got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for SufficiencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sufficient => "SUFFICIENT",
            Self::Partial => "PARTIAL",
            Self::Insufficient => "INSUFFICIENT",
        };
        write!(f, "{}", s)
    }
}

/// Something the evaluator still needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformationGap {
    /// Free-form category, e.g. `resolution` or `mechanism`.
    pub category: String,
    pub description: String,
    /// Lower is more urgent.
    pub priority: i32,
    pub suggested_tool: Option<ToolId>,
}

impl InformationGap {
    pub fn new(category: impl Into<String>, description: impl Into<String>, priority: i32) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            priority,
            suggested_tool: None,
        }
    }

    pub fn suggesting(mut self, tool: ToolId) -> Self {
        self.suggested_tool = Some(tool);
        self
    }
}

/// Structured judgment of whether the query can be answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SufficiencyEvaluation {
    pub status: SufficiencyStatus,
    confidence: f64,
    pub reasoning: String,
    pub gaps: Vec<InformationGap>,
    pub can_answer_now: bool,
}

impl SufficiencyEvaluation {
    /// Creates an evaluation.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if confidence is not within `[0, 1]`
    pub fn new(
        status: SufficiencyStatus,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::out_of_range("confidence", 0.0, 1.0, confidence));
        }
        Ok(Self {
            status,
            confidence,
            reasoning: reasoning.into(),
            gaps: Vec::new(),
            can_answer_now: false,
        })
    }

    pub fn with_gaps(mut self, mut gaps: Vec<InformationGap>) -> Self {
        gaps.sort_by_key(|g| g.priority);
        self.gaps = gaps;
        self
    }

    pub fn answerable_now(mut self, can_answer_now: bool) -> Self {
        self.can_answer_now = can_answer_now;
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// True when the loop should stop and synthesize.
    pub fn is_sufficient(&self) -> bool {
        self.status == SufficiencyStatus::Sufficient || self.can_answer_now
    }

    /// One-line observation for the rolling summary.
    pub fn observation(&self) -> String {
        let mut line = format!(
            "{} (confidence {:.2}): {}",
            self.status, self.confidence, self.reasoning
        );
        if !self.gaps.is_empty() {
            let gaps: Vec<String> = self
                .gaps
                .iter()
                .map(|g| format!("{}: {}", g.category, g.description))
                .collect();
            line.push_str(&format!(" | gaps: {}", gaps.join("; ")));
        }
        line
    }
}
