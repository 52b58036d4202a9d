//! Shared domain types and rules for the ContentFlow backend.
//!
//! Nothing in this crate touches the database or the network; it holds the
//! vocabulary the other crates agree on (ids, timestamps, errors, content
//! statuses, event names) plus small pure rules such as webhook filter
//! matching.

pub mod clock;
pub mod content;
pub mod error;
pub mod event_names;
pub mod search;
pub mod types;
pub mod webhook;
