//! Closed set of tool identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version of the tool catalogue. Bumped whenever a variant or a declared
/// parameter changes.
pub const TOOL_CATALOGUE_VERSION: u32 = 1;

/// Every tool the planner may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    ResolveDrugs,
    ResolveGenes,
    ResolveDiseases,
    ResolveAdverseEvents,
    DrugAdverseEvents,
    DrugTargets,
    GeneDiseases,
    DiseaseDrugs,
    AdverseEventDrugs,
    ClaimEvidence,
    MechanisticPaths,
}

impl ToolId {
    pub const ALL: [ToolId; 11] = [
        ToolId::ResolveDrugs,
        ToolId::ResolveGenes,
        ToolId::ResolveDiseases,
        ToolId::ResolveAdverseEvents,
        ToolId::DrugAdverseEvents,
        ToolId::DrugTargets,
        ToolId::GeneDiseases,
        ToolId::DiseaseDrugs,
        ToolId::AdverseEventDrugs,
        ToolId::ClaimEvidence,
        ToolId::MechanisticPaths,
    ];

    /// Wire name used by planners.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::ResolveDrugs => "resolve_drugs",
            ToolId::ResolveGenes => "resolve_genes",
            ToolId::ResolveDiseases => "resolve_diseases",
            ToolId::ResolveAdverseEvents => "resolve_adverse_events",
            ToolId::DrugAdverseEvents => "drug_adverse_events",
            ToolId::DrugTargets => "drug_targets",
            ToolId::GeneDiseases => "gene_diseases",
            ToolId::DiseaseDrugs => "disease_drugs",
            ToolId::AdverseEventDrugs => "adverse_event_drugs",
            ToolId::ClaimEvidence => "claim_evidence",
            ToolId::MechanisticPaths => "mechanistic_paths",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tool name that is not part of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolId {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ToolId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTool(wanted.to_string()))
    }
}

/// Tool named by a plan: either in the catalogue or not.
///
/// Unknown names survive plan parsing so that they can be reported as a
/// failed result instead of rejecting the whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlannedTool {
    Known(ToolId),
    Unknown(String),
}

impl PlannedTool {
    /// Classifies a raw tool name.
    pub fn parse(name: &str) -> Self {
        match name.parse::<ToolId>() {
            Ok(id) => PlannedTool::Known(id),
            Err(UnknownTool(raw)) => PlannedTool::Unknown(raw),
        }
    }

    pub fn known(&self) -> Option<ToolId> {
        match self {
            PlannedTool::Known(id) => Some(*id),
            PlannedTool::Unknown(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlannedTool::Known(id) => id.as_str(),
            PlannedTool::Unknown(raw) => raw,
        }
    }
}

impl From<ToolId> for PlannedTool {
    fn from(id: ToolId) -> Self {
        PlannedTool::Known(id)
    }
}

impl fmt::Display for PlannedTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
