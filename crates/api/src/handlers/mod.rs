//! HTTP request handlers, one module per resource.

pub mod content;
pub mod webhook;
