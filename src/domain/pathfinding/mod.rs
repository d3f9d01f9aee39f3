//! Mechanistic path finding and scoring.
//!
//! - [`PathFinder`] enumerates candidate paths over the claim graph port
//! - [`PathScorer`] ranks them under a [`ScoringPolicy`]

mod finder;
mod path;
mod policy;
mod scorer;

pub use finder::{route_templates, PathFinder, PathQuery, DEFAULT_EDGE_STRENGTH, MAX_HOPS};
pub use path::{MechanisticPath, PathStep};
pub use policy::{ScoringPolicy, DEFAULT_CONDITION_BOOST};
pub use scorer::{ExplainedPath, PathScorer, ScoreBreakdown, ScoredPath};
