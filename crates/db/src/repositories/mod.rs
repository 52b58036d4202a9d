//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that run inside a store transaction accept any [`sqlx::PgExecutor`]
//! (a pool or `&mut PgConnection`); the rest take `&PgPool`.

pub mod content_repo;
pub mod content_version_repo;
pub mod taxonomy_repo;
pub mod webhook_repo;

pub use content_repo::ContentRepo;
pub use content_version_repo::ContentVersionRepo;
pub use taxonomy_repo::TaxonomyRepo;
pub use webhook_repo::WebhookRepo;
