//! Placeholder substitution against the session's resolved entities.

use crate::domain::entities::{EntityClass, ResolvedEntityMap};

use super::{ArgValue, EntityRef, ToolArgs};

/// Replaces one entity reference with a resolved identifier when possible.
///
/// Index placeholders take the N-th identifier resolved for the class. An
/// out-of-range index falls back to the first resolved identifier when the
/// class has any. Names are looked up after class normalization. A miss
/// leaves the reference untouched.
pub fn substitute_ref(
    resolved: &ResolvedEntityMap,
    class: EntityClass,
    entity: &EntityRef,
) -> EntityRef {
    match entity {
        EntityRef::Literal(_) => entity.clone(),
        EntityRef::Index(index) => match resolved.nth(class, *index) {
            Some(id) => EntityRef::Literal(id),
            None => match resolved.nth(class, 0) {
                Some(first) => {
                    tracing::warn!(
                        class = %class,
                        index = index,
                        resolved = resolved.len(class),
                        "Placeholder index out of range, using first resolved id"
                    );
                    EntityRef::Literal(first)
                }
                None => entity.clone(),
            },
        },
        EntityRef::Name(name) => match resolved.lookup(class, name) {
            Some(id) => EntityRef::Literal(id),
            None => entity.clone(),
        },
    }
}

impl ToolArgs {
    /// Returns a copy with every entity placeholder substituted.
    pub fn substituted(&self, resolved: &ResolvedEntityMap) -> ToolArgs {
        let mut out = self.clone();
        for (_, value) in out.iter_mut() {
            match value {
                ArgValue::Entity { class, entity } => {
                    *entity = substitute_ref(resolved, *class, entity);
                }
                ArgValue::Entities { class, entities } => {
                    for entity in entities.iter_mut() {
                        *entity = substitute_ref(resolved, *class, entity);
                    }
                }
                ArgValue::Scalar { .. } | ArgValue::List { .. } => {}
            }
        }
        out
    }
}
