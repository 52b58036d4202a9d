//! External delivery channels for platform events.

pub mod webhook;
