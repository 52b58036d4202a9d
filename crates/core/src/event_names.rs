//! Well-known event name constants.
//!
//! These are the names webhook subscribers list in their `events` filter and
//! the `event` field of every delivered webhook body.

/// A content record (or a translation of one) was created.
pub const CONTENT_CREATE: &str = "content.create";

/// A content record was updated and a new version recorded.
pub const CONTENT_UPDATE: &str = "content.update";

/// A content record was reverted to an earlier snapshot.
pub const CONTENT_REVERT: &str = "content.revert";

/// A scheduled content record was promoted to published by the scheduler.
pub const CONTENT_PUBLISHED: &str = "content.published";

/// A content record was soft-deleted.
pub const CONTENT_DELETE: &str = "content.delete";

/// Source entity kind attached to all content events.
pub const ENTITY_CONTENT: &str = "content";
