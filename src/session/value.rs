//! Change-tracking wrapper around a loaded session record.

use std::sync::OnceLock;

use serde_json::Map;
use serde_json::Value;

use crate::constants::TRANSPORT_FIELDS;
use crate::session::patch;
use crate::session::patch::PatchOp;

/// A session record loaded from storage, tracking the changes made to it.
///
/// The value holds the snapshot it was loaded with (`original`) alongside
/// the live fields a request handler mutates (`current`). The diff between
/// the two is computed once, the first time it is needed, and memoized:
/// computing it finalizes the value's lifecycle, and field mutations after
/// that point are deliberately not reflected.
///
/// Values are created by [`SessionStore::get`] and consumed by
/// [`SessionStore::set`]; they are never shared between request handlers.
///
/// [`SessionStore::get`]: crate::SessionStore::get
/// [`SessionStore::set`]: crate::SessionStore::set
#[derive(Debug)]
pub struct SessionValue {
    original: Map<String, Value>,
    current: Map<String, Value>,
    from_destroyed: bool,
    destroyed: bool,
    persisting: bool,
    cached_diff: OnceLock<Vec<PatchOp>>,
}

impl SessionValue {
    /// Wraps raw record data. `from_destroyed` marks a value constructed
    /// from a tombstone record.
    pub fn new(
        data: Map<String, Value>,
        from_destroyed: bool,
    ) -> Self {
        Self {
            original: data.clone(),
            current: data,
            from_destroyed,
            destroyed: false,
            persisting: true,
            cached_diff: OnceLock::new(),
        }
    }

    /// Marks the session to be destroyed when it is next saved. No I/O
    /// happens until then.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Suppresses persistence of any changes made to this session.
    pub fn forget(&mut self) {
        self.persisting = false;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_forgotten(&self) -> bool {
        !self.persisting
    }

    /// Whether the record was a tombstone when this value was loaded.
    pub fn is_from_destroyed(&self) -> bool {
        self.from_destroyed
    }

    /// The snapshot the value was loaded with. Never mutated.
    pub fn original(&self) -> &Map<String, Value> {
        &self.original
    }

    /// The live session fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.current
    }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&Value> {
        self.current.get(field)
    }

    /// Mutable access to a field, for in-place edits of nested values.
    pub fn get_mut(
        &mut self,
        field: &str,
    ) -> Option<&mut Value> {
        self.current.get_mut(field)
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: Value,
    ) -> Option<Value> {
        self.current.insert(field.into(), value)
    }

    pub fn remove(
        &mut self,
        field: &str,
    ) -> Option<Value> {
        self.current.remove(field)
    }

    /// The changes made to this session since it was loaded.
    ///
    /// Computed once and memoized; call only when done mutating and ready
    /// to save. Later mutations are not reflected in the returned patch.
    pub fn changes(&self) -> &[PatchOp] {
        self.cached_diff.get_or_init(|| {
            patch::diff(
                &Value::Object(trim(&self.original)),
                &Value::Object(trim(&self.current)),
            )
        })
    }

    /// Whether saving this session would write anything.
    ///
    /// A value loaded from a tombstone always counts as changed: its
    /// caller's view may carry stale assumptions about the record's prior
    /// existence.
    pub fn has_changed(&self) -> bool {
        self.is_from_destroyed() || !self.changes().is_empty()
    }

    /// Rebases `other`'s changes onto this value's original snapshot.
    ///
    /// This is the three-way-merge primitive: each writer's diff is
    /// computed against its own load-time snapshot, then replayed on top
    /// of whatever is freshly persisted, so concurrent writers touching
    /// disjoint fields both survive.
    pub fn apply_changes(
        &self,
        other: &SessionValue,
    ) -> Map<String, Value> {
        let base = Value::Object(trim(&self.original));
        match patch::apply(&base, other.changes()) {
            Value::Object(merged) => merged,
            _ => Map::new(),
        }
    }
}

/// Copies a record without its transport-only fields. Only caller-visible
/// session fields participate in diffing and persistence.
pub(crate) fn trim(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .filter(|(key, _)| !TRANSPORT_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
