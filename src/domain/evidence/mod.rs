//! Evidence accumulation, sampling and provenance.

mod accumulator;
mod provenance;
mod sampling;

pub use accumulator::EvidenceAccumulator;
pub use provenance::{ProvenanceEntry, ProvenanceLedger, ProvenanceSummary};
pub use sampling::{grouping_key, stratified_sample, Sample, GROUP_KEYS};
