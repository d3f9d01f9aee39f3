//! Tagged payload returned by tool functions.

use serde::Serialize;
use serde_json::{Map, Value};

/// One result row. Keys keep insertion order (`preserve_order`), which
/// resolution records rely on for positional placeholders.
pub type Record = Map<String, Value>;

/// Result of a successful tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum Payload {
    List(Vec<Record>),
    Record(Record),
    Empty,
}

impl Payload {
    /// Builds a payload from loosely shaped JSON.
    ///
    /// Arrays become lists (non-object elements are wrapped under `value`),
    /// objects become records, `null` is empty and any other scalar is a
    /// one-field record.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Payload::Empty,
            Value::Object(map) => Payload::Record(map),
            Value::Array(items) => Payload::List(items.into_iter().map(into_record).collect()),
            scalar => Payload::Record(into_record(scalar)),
        }
    }

    /// Number of rows; a non-empty record counts as one.
    pub fn len(&self) -> usize {
        match self {
            Payload::List(items) => items.len(),
            Payload::Record(record) => usize::from(!record.is_empty()),
            Payload::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenates two payloads of one tool.
    ///
    /// Empty sides vanish; anything else is promoted to a list.
    pub fn concat(self, other: Payload) -> Payload {
        match (self, other) {
            (Payload::Empty, other) => other,
            (this, Payload::Empty) => this,
            (this, other) => {
                let mut items = this.into_rows();
                items.extend(other.into_rows());
                Payload::List(items)
            }
        }
    }

    /// Consumes the payload into its rows.
    pub fn into_rows(self) -> Vec<Record> {
        match self {
            Payload::List(items) => items,
            Payload::Record(record) => vec![record],
            Payload::Empty => Vec::new(),
        }
    }
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_classifies_shapes() {
        assert_eq!(Payload::from_json(Value::Null), Payload::Empty);
        assert!(matches!(Payload::from_json(json!({"a": 1})), Payload::Record(_)));
        assert_eq!(Payload::from_json(json!([{"a": 1}, 2])).len(), 2);
    }

    #[test]
    fn concat_promotes_records_to_list() {
        let a = Payload::from_json(json!({"id": 1}));
        let b = Payload::from_json(json!([{"id": 2}, {"id": 3}]));
        let merged = a.concat(b);
        assert_eq!(merged.len(), 3);
        assert!(matches!(merged, Payload::List(_)));
    }

    #[test]
    fn empty_record_has_no_rows() {
        assert!(Payload::Record(Record::new()).is_empty());
        assert_eq!(Payload::from_json(json!({"metformin": 14042})).len(), 1);
    }

    #[test]
    fn concat_with_empty_keeps_shape() {
        let a = Payload::from_json(json!({"id": 1}));
        assert!(matches!(a.concat(Payload::Empty), Payload::Record(_)));
    }
}
