//! Structured diffs between session snapshots.
//!
//! Operations are JSON-Patch-shaped (`add`, `replace`, `remove`) and address
//! fields by JSON-Pointer path. [`apply`] replays an operation sequence
//! positionally onto a copy of a base value, so
//! `apply(before, &diff(before, after))` reproduces `after` for any pair of
//! records.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A single field-level change between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Replace { path: String, value: Value },
    Remove { path: String },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. } => path,
            PatchOp::Replace { path, .. } => path,
            PatchOp::Remove { path } => path,
        }
    }
}

/// Computes the ordered operations transforming `before` into `after`.
pub fn diff(
    before: &Value,
    after: &Value,
) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_at("", before, after, &mut ops);
    ops
}

fn diff_at(
    path: &str,
    before: &Value,
    after: &Value,
    ops: &mut Vec<PatchOp>,
) {
    match (before, after) {
        (Value::Object(before_map), Value::Object(after_map)) => {
            for (key, before_value) in before_map {
                let child = object_path(path, key);
                match after_map.get(key) {
                    Some(after_value) => diff_at(&child, before_value, after_value, ops),
                    None => ops.push(PatchOp::Remove { path: child }),
                }
            }
            for (key, after_value) in after_map {
                if !before_map.contains_key(key) {
                    ops.push(PatchOp::Add {
                        path: object_path(path, key),
                        value: after_value.clone(),
                    });
                }
            }
        }
        (Value::Array(before_items), Value::Array(after_items)) => {
            let shared = before_items.len().min(after_items.len());
            for (index, (before_value, after_value)) in
                before_items.iter().zip(after_items.iter()).enumerate()
            {
                diff_at(&index_path(path, index), before_value, after_value, ops);
            }
            for (index, after_value) in after_items.iter().enumerate().skip(shared) {
                ops.push(PatchOp::Add {
                    path: index_path(path, index),
                    value: after_value.clone(),
                });
            }
            // Dropped elements are removed back to front so earlier removals
            // do not shift the indices of later ones.
            for index in (shared..before_items.len()).rev() {
                ops.push(PatchOp::Remove {
                    path: index_path(path, index),
                });
            }
        }
        _ => {
            if before != after {
                ops.push(PatchOp::Replace {
                    path: path.to_string(),
                    value: after.clone(),
                });
            }
        }
    }
}

/// Applies `ops` in order onto a copy of `base`.
///
/// Sequences produced by [`diff`] always resolve against their base; a
/// foreign op whose path does not address an existing location is skipped.
pub fn apply(
    base: &Value,
    ops: &[PatchOp],
) -> Value {
    let mut output = base.clone();
    for op in ops {
        apply_op(&mut output, op);
    }
    output
}

fn apply_op(
    target: &mut Value,
    op: &PatchOp,
) {
    let path = op.path();
    if path.is_empty() {
        match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => {
                *target = value.clone();
            }
            PatchOp::Remove { .. } => {}
        }
        return;
    }

    let tokens: Vec<String> = path.split('/').skip(1).map(unescape).collect();
    let Some((parent, last)) = descend(target, &tokens) else {
        return;
    };

    match parent {
        Value::Object(map) => match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => {
                map.insert(last.to_string(), value.clone());
            }
            PatchOp::Remove { .. } => {
                map.remove(last);
            }
        },
        Value::Array(items) => {
            let Some(index) = array_index(last, items.len()) else {
                return;
            };
            match op {
                PatchOp::Add { value, .. } => {
                    if index <= items.len() {
                        items.insert(index, value.clone());
                    }
                }
                PatchOp::Replace { value, .. } => {
                    if index < items.len() {
                        items[index] = value.clone();
                    }
                }
                PatchOp::Remove { .. } => {
                    if index < items.len() {
                        items.remove(index);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Walks `root` down to the parent of the addressed location, returning the
/// parent container and the final reference token.
fn descend<'a>(
    root: &'a mut Value,
    tokens: &'a [String],
) -> Option<(&'a mut Value, &'a str)> {
    let (last, ancestors) = tokens.split_last()?;
    let mut cursor = root;
    for token in ancestors {
        cursor = match cursor {
            Value::Object(map) => map.get_mut(token.as_str())?,
            Value::Array(items) => {
                let index = token.parse::<usize>().ok()?;
                items.get_mut(index)?
            }
            _ => return None,
        };
    }
    Some((cursor, last.as_str()))
}

/// Resolves an array reference token. `-` addresses the end of the array.
fn array_index(
    token: &str,
    len: usize,
) -> Option<usize> {
    if token == "-" {
        return Some(len);
    }
    token.parse::<usize>().ok()
}

fn object_path(
    path: &str,
    key: &str,
) -> String {
    format!("{}/{}", path, escape(key))
}

fn index_path(
    path: &str,
    index: usize,
) -> String {
    format!("{}/{}", path, index)
}

/// JSON-Pointer escaping: `~` becomes `~0`, `/` becomes `~1`.
fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
