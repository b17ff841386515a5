//! Optional multi-workspace scoping.
//!
//! When an organization enables multi-workspace mode, every API call can be
//! scoped to the selected workspace. The [`WorkspaceResolver`] owns the
//! workspace list, the current selection (persisted in client storage) and
//! the filter parameter handed to data fetching.

pub mod api;
pub mod in_memory;
pub mod model;
pub mod resolver;
pub mod scope;

pub use api::{HttpWorkspaceApi, WorkspaceApi};
pub use in_memory::InMemoryWorkspaceApi;
pub use model::{CreateWorkspace, UpdateWorkspace, Workspace, WorkspaceSettings, WorkspaceStatus};
pub use resolver::{CURRENT_WORKSPACE_KEY, ResolverError, WorkspaceResolver};
pub use scope::{AuthSnapshot, ORGANIZATION_ID_KEY, resolve_organization_id};
