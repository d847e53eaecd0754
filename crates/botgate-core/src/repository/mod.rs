//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (botgate-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod bot;
pub mod credential;

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}
