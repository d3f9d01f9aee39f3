//! Entity Resolution Context.
//!
//! Accumulates name → identifier mappings discovered by resolution tools
//! during one orchestration session. Entries are append-only and keep
//! first-resolved order so positional placeholders stay stable across
//! iterations.

use serde::Serialize;
use std::collections::HashMap;

use super::EntityClass;

/// Identifier of an entity in the claim graph.
pub type EntityId = i64;

/// Outcome of [`ResolvedEntityMap::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The key was new and has been appended.
    Inserted,
    /// The key already mapped to the same identifier.
    Unchanged,
    /// The key already mapped to a different identifier; the first
    /// mapping is kept.
    Conflict { kept: EntityId, rejected: EntityId },
}

/// Ordered key → id store for a single entity class.
#[derive(Debug, Clone, Default, Serialize)]
struct ClassIndex {
    entries: Vec<(String, EntityId)>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl ClassIndex {
    fn add(&mut self, key: String, id: EntityId) -> AddOutcome {
        if let Some(&pos) = self.positions.get(&key) {
            let existing = self.entries[pos].1;
            return if existing == id {
                AddOutcome::Unchanged
            } else {
                AddOutcome::Conflict {
                    kept: existing,
                    rejected: id,
                }
            };
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, id));
        AddOutcome::Inserted
    }

    fn lookup(&self, key: &str) -> Option<EntityId> {
        self.positions.get(key).map(|&pos| self.entries[pos].1)
    }

    fn nth(&self, index: usize) -> Option<EntityId> {
        self.entries.get(index).map(|(_, id)| *id)
    }
}

/// Four independent, append-only mappings: one per [`EntityClass`].
///
/// Owned by exactly one orchestration session and mutated only through the
/// tool executor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedEntityMap {
    drug: ClassIndex,
    gene: ClassIndex,
    disease: ClassIndex,
    adverse_event: ClassIndex,
}

impl ResolvedEntityMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, class: EntityClass) -> &ClassIndex {
        match class {
            EntityClass::Drug => &self.drug,
            EntityClass::Gene => &self.gene,
            EntityClass::Disease => &self.disease,
            EntityClass::AdverseEvent => &self.adverse_event,
        }
    }

    fn index_mut(&mut self, class: EntityClass) -> &mut ClassIndex {
        match class {
            EntityClass::Drug => &mut self.drug,
            EntityClass::Gene => &mut self.gene,
            EntityClass::Disease => &mut self.disease,
            EntityClass::AdverseEvent => &mut self.adverse_event,
        }
    }

    /// Records `key → id` for a class. The key is normalized first.
    ///
    /// First write wins: re-adding a key with a different id leaves the
    /// original mapping in place and reports a conflict.
    pub fn add(&mut self, class: EntityClass, key: &str, id: EntityId) -> AddOutcome {
        let normalized = class.normalize_key(key);
        self.index_mut(class).add(normalized, id)
    }

    /// Looks up an identifier by (un-normalized) name or symbol.
    pub fn lookup(&self, class: EntityClass, key: &str) -> Option<EntityId> {
        self.index(class).lookup(&class.normalize_key(key))
    }

    /// Returns the identifier resolved `index`-th for a class.
    pub fn nth(&self, class: EntityClass, index: usize) -> Option<EntityId> {
        self.index(class).nth(index)
    }

    /// Number of resolved entries for a class.
    pub fn len(&self, class: EntityClass) -> usize {
        self.index(class).entries.len()
    }

    /// True when nothing has been resolved for any class.
    pub fn is_empty(&self) -> bool {
        EntityClass::ALL.iter().all(|c| self.len(*c) == 0)
    }

    /// Entries of one class in first-resolved order.
    pub fn entries(&self, class: EntityClass) -> impl Iterator<Item = (&str, EntityId)> {
        self.index(class)
            .entries
            .iter()
            .map(|(key, id)| (key.as_str(), *id))
    }

    /// Renders the map for a planning prompt, including positional indices.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "(none resolved yet)".to_string();
        }
        let mut lines = Vec::new();
        for class in EntityClass::ALL {
            let rendered: Vec<String> = self
                .entries(class)
                .enumerate()
                .map(|(i, (key, id))| format!("#{} {}={}", i, key, id))
                .collect();
            if !rendered.is_empty() {
                lines.push(format!("{}: {}", class, rendered.join(", ")));
            }
        }
        lines.join("\n")
    }
}
