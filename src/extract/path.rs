//! Tagged key-path lookups over decoded JSON payloads
//!
//! Each site defines a fixed table mapping record fields to a `FieldPath`: a
//! chain of key accesses, optionally ending in a join over a collection leaf.
//! Any missing segment resolves to `None`; a path never fails a record.

use serde_json::Value;

/// One step in a key path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Descend into an object by key
    Key(&'static str),

    /// Descend into the first value of an object map
    ///
    /// Some payloads key their single entry by an opaque listing id, so the
    /// key itself cannot appear in a static table.
    AnyEntry,
}

/// A lookup path from the payload root to one field value
#[derive(Debug, Clone, Copy)]
pub struct FieldPath {
    steps: &'static [Step],
    /// When set, a collection leaf is joined with this separator
    join: Option<&'static str>,
}

impl FieldPath {
    /// A nested path of keys
    pub const fn nested(steps: &'static [Step]) -> Self {
        Self { steps, join: None }
    }

    /// A nested path whose leaf collection is joined with `separator`
    pub const fn joined(steps: &'static [Step], separator: &'static str) -> Self {
        Self {
            steps,
            join: Some(separator),
        }
    }

    /// Resolves this path against a payload root
    ///
    /// Returns `None` when any segment is absent or the leaf cannot be
    /// rendered as a string.
    pub fn lookup(&self, root: &Value) -> Option<String> {
        let mut current = root;
        for step in self.steps {
            current = match step {
                Step::Key(name) => current.as_object()?.get(*name)?,
                Step::AnyEntry => current.as_object()?.values().next()?,
            };
        }
        self.render(current)
    }

    fn render(&self, leaf: &Value) -> Option<String> {
        match leaf {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Array(items) => {
                let separator = self.join?;
                Some(
                    items
                        .iter()
                        .filter_map(render_scalar)
                        .collect::<Vec<_>>()
                        .join(separator),
                )
            }
            Value::Object(map) => {
                // Joining an object joins its values, e.g. address parts.
                let separator = self.join?;
                Some(
                    map.values()
                        .filter_map(render_scalar)
                        .collect::<Vec<_>>()
                        .join(separator),
                )
            }
            Value::Null => None,
        }
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
