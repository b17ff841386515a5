//! `grc-auth` — client-side permission resolution.
//!
//! Answers capability questions for the signed-in user from a flattened set of
//! effective permissions. Every query fails closed until permissions load.
//! Also owns the auditor portal session persisted in session storage.

pub mod admin;
pub mod auditor;
pub mod cache;
pub mod fetch;
pub mod gate;
pub mod permissions;
pub mod resolver;

pub use admin::{AdminPolicy, GroupNameAdminPolicy};
pub use auditor::{AUDITOR_SESSION_KEY, AuditorSession, AuditorSessionStore};
pub use cache::PermissionCache;
pub use fetch::{EffectivePermissionsResponse, GroupRef, HttpPermissionFetcher, PermissionFetcher};
pub use gate::{GateDecision, PermissionGate, PermissionRequirement};
pub use permissions::{
    Action, EffectivePermission, Ownership, PermissionOrigin, PermissionScope, Role,
    UserPermissions,
};
pub use resolver::{PermissionResolver, PermissionState};
