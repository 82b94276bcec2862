// -
// Key namespaces

/// Marker stored in place of a session record once it has been destroyed.
/// Distinct from any valid JSON document, so a destroyed record is never
/// mistaken for session data.
pub(crate) const TOMBSTONE: &str = "DESTROYED";

/// Suffix appended to a session key to form its lock key.
pub(crate) const LOCK_KEY_SUFFIX: &str = ":lock";

/// Default prefix for session keys.
pub(crate) const DEFAULT_SESSION_KEY_PREFIX: &str = "session:";

// -
// Record fields

/// Transport-only fields a host framework may attach to a record (e.g. a
/// cookie descriptor). Stripped before diffing and persistence.
pub(crate) const TRANSPORT_FIELDS: &[&str] = &["cookie"];
