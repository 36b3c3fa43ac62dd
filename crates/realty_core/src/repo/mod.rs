//! Repository facade and backend bindings.
//!
//! # Responsibility
//! - Define the content repository contract presentation code talks to.
//! - Keep backend query details out of services and callers.
//!
//! # Invariants
//! - Every binding runs entity validation before it writes.
//! - Lookup misses are values (`None`, empty collections), not errors.

pub mod content_repo;
pub mod sqlite_repo;

pub use content_repo::{ContentRepository, RepoError, RepoResult};
pub use sqlite_repo::{SqliteContentRepository, SqliteTarget};
