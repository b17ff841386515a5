//! `grc-core` — shared building blocks for the GRC policy layer.
//!
//! This crate holds identifiers, the domain error model and the client-side
//! storage abstraction. It performs no IO of its own.

pub mod error;
pub mod id;
pub mod storage;

pub use error::DomainError;
pub use id::{OrganizationId, UserId, WorkspaceId};
pub use storage::{ClientStorage, MemoryStorage, StorageError};
