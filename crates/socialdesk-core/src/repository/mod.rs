//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (socialdesk-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod account;
pub mod brand;
pub mod conversation;
pub mod media;
pub mod post;

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}
