//! Content status values and field rules.
//!
//! Statuses are stored as lowercase text in `contents.status` and
//! `content_versions.status`. Client input is accepted case-insensitively so
//! `"DRAFT"` and `"draft"` are equivalent.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Language assigned to new content when the client omits one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Minimum length for titles and slugs.
pub const MIN_TITLE_LENGTH: usize = 3;

/// Maximum length for slugs.
pub const MAX_SLUG_LENGTH: usize = 200;

/// Lowercase words separated by single hyphens, e.g. `hello-world-2`.
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// Two-letter ISO 639-1 code.
static LANGUAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// ContentStatus
// ---------------------------------------------------------------------------

/// Publication state of a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
    /// Waiting for `published_at` to elapse; promoted by the scheduler.
    Scheduled,
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 3] = [Self::Draft, Self::Published, Self::Scheduled];

    /// The value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Scheduled => "scheduled",
        }
    }

    /// Parse a client-supplied status, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == normalized)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid status '{value}'. Must be one of: draft, published, scheduled"
                ))
            })
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a slug: lowercase alphanumerics and single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.len() < MIN_TITLE_LENGTH || slug.len() > MAX_SLUG_LENGTH {
        return Err(CoreError::Validation(format!(
            "Slug must be between {MIN_TITLE_LENGTH} and {MAX_SLUG_LENGTH} characters"
        )));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(CoreError::Validation(format!(
            "Slug '{slug}' may only contain lowercase letters, digits and single hyphens"
        )));
    }
    Ok(())
}

/// Validate a two-letter language code.
pub fn validate_language(language: &str) -> Result<(), CoreError> {
    if !LANGUAGE_RE.is_match(language) {
        return Err(CoreError::Validation(format!(
            "Language '{language}' must be a two-letter lowercase code"
        )));
    }
    Ok(())
}

/// Treat empty (or whitespace-only) strings as absent.
///
/// Partial updates leave a field untouched when the client sends `""`.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
