//! Entities - classes of graph entity and the per-session resolution context.

mod entity_class;
mod resolution;

pub use entity_class::EntityClass;
pub use resolution::{AddOutcome, EntityId, ResolvedEntityMap};
