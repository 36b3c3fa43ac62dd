//! Content model for the real-estate site.
//!
//! # Responsibility
//! - Define the entity shapes exchanged between presentation code and any
//!   repository backend.
//! - Define patch types and the create/merge rules applied to them.
//!
//! # Invariants
//! - Wire field names are camelCase; enum values are lowercase/kebab-case.
//! - Relationships are stored as bare `EntityId`s, never embedded records.
//! - Deletion is a hard delete; there are no tombstones.

pub mod agent;
pub mod article;
pub mod client;
pub mod content;
pub mod entity;
pub mod inquiry;
pub(crate) mod patch;
pub mod property;
pub mod settings;
pub mod validation;
