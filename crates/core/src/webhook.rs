//! Webhook subscription filter rules.
//!
//! A webhook's `events` column is either empty, the wildcard `*`, or a
//! comma-separated list of exact event names.

/// Filter value that subscribes a webhook to every event.
pub const WILDCARD: &str = "*";

/// Whether a webhook with the given `events` filter should receive `event`.
///
/// Entries are trimmed before comparison; matching is exact string equality.
pub fn webhook_matches_event(filter: &str, event: &str) -> bool {
    let filter = filter.trim();
    if filter.is_empty() || filter == WILDCARD {
        return true;
    }
    filter.split(',').any(|entry| entry.trim() == event)
}

/// Normalise a filter for storage: trim entries and drop empty ones.
///
/// `" content.create , ,content.update"` becomes
/// `"content.create,content.update"`.
pub fn normalize_event_filter(filter: &str) -> String {
    filter
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_names::{CONTENT_CREATE, CONTENT_PUBLISHED, CONTENT_UPDATE};

    #[test]
    fn listed_events_match_exactly() {
        let filter = "content.create,content.update";
        assert!(webhook_matches_event(filter, CONTENT_UPDATE));
        assert!(webhook_matches_event(filter, CONTENT_CREATE));
        assert!(!webhook_matches_event(filter, CONTENT_PUBLISHED));
    }

    #[test]
    fn empty_and_wildcard_match_everything() {
        assert!(webhook_matches_event("", CONTENT_PUBLISHED));
        assert!(webhook_matches_event("*", CONTENT_PUBLISHED));
        assert!(webhook_matches_event(" * ", "anything.else"));
    }

    #[test]
    fn entries_are_trimmed() {
        assert!(webhook_matches_event(" content.create ,  content.update ", CONTENT_UPDATE));
    }

    #[test]
    fn prefixes_do_not_match() {
        assert!(!webhook_matches_event("content", CONTENT_UPDATE));
        assert!(!webhook_matches_event("content.update.extra", CONTENT_UPDATE));
    }

    #[test]
    fn normalize_drops_blank_entries() {
        assert_eq!(
            normalize_event_filter(" content.create , ,content.update"),
            "content.create,content.update"
        );
        assert_eq!(normalize_event_filter("*"), "*");
        assert_eq!(normalize_event_filter("  "), "");
    }
}
