//! Splitting of plural values supplied to single-id parameters.

use super::{ArgValue, ParamKind, ToolArgs, ToolDefinition};

/// Arguments for the immediate call plus the deferred follow-up calls.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitArgs {
    pub first: ToolArgs,
    pub deferred: Vec<ToolArgs>,
}

/// Collapses list values on single-id parameters into repeated calls.
///
/// The first identifier of the first such parameter stays in the
/// immediate call; each remaining identifier produces a copy of the
/// arguments with that identifier substituted. Other plural single-id
/// parameters keep only their first identifier.
pub fn split_plural(definition: &ToolDefinition, args: &ToolArgs) -> SplitArgs {
    let mut first = args.clone();
    let mut deferred = Vec::new();
    let mut split_done = false;

    for spec in &definition.params {
        let single_slot = matches!(
            spec.kind,
            ParamKind::EntityId(_) | ParamKind::DynamicEntityId { .. }
        );
        if !single_slot {
            continue;
        }
        let (class, entities) = match args.get(spec.name) {
            Some(ArgValue::Entities { class, entities }) if !entities.is_empty() => {
                (*class, entities)
            }
            _ => continue,
        };

        first.insert(
            spec.name,
            ArgValue::Entity {
                class,
                entity: entities[0].clone(),
            },
        );

        if split_done {
            tracing::warn!(
                tool = %definition.id,
                param = spec.name,
                dropped = entities.len() - 1,
                "Only one parameter per call is split, keeping first value"
            );
            continue;
        }
        split_done = true;

        for entity in &entities[1..] {
            let mut extra = args.clone();
            extra.insert(
                spec.name,
                ArgValue::Entity {
                    class,
                    entity: entity.clone(),
                },
            );
            deferred.push(extra);
        }
    }

    // Deferred copies inherit the collapsed form of any other plural slot.
    for extra in deferred.iter_mut() {
        for (name, value) in first.iter() {
            let collapse = matches!(extra.get(name), Some(ArgValue::Entities { .. }))
                && matches!(value, ArgValue::Entity { .. });
            if collapse {
                extra.insert(name.clone(), value.clone());
            }
        }
    }

    SplitArgs { first, deferred }
}
