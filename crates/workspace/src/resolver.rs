//! Workspace selection and scoping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::RwLock;

use grc_client::ClientError;
use grc_core::{ClientStorage, OrganizationId, StorageError, WorkspaceId};

use crate::api::WorkspaceApi;
use crate::model::{CreateWorkspace, UpdateWorkspace, Workspace};
use crate::scope::{AuthSnapshot, resolve_organization_id};

/// Client storage key holding the selected workspace id.
pub const CURRENT_WORKSPACE_KEY: &str = "grc-current-workspace";

#[derive(Debug, Error)]
pub enum ResolverError {
    /// The backend rejected the session; the caller's global 401 handling
    /// must see this.
    #[error("session rejected while loading workspaces: {0}")]
    Unauthorized(ClientError),

    #[error("workspace request failed: {0}")]
    Api(ClientError),

    #[error("no organization in scope")]
    NoOrganization,

    #[error("workspace {0} is not in the loaded list")]
    UnknownWorkspace(WorkspaceId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ResolverError {
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            ResolverError::Unauthorized(e) | ResolverError::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClientError> for ResolverError {
    fn from(err: ClientError) -> Self {
        if err.is_unauthorized() {
            ResolverError::Unauthorized(err)
        } else {
            ResolverError::Api(err)
        }
    }
}

#[derive(Debug, Default)]
struct State {
    auth: AuthSnapshot,
    enabled: bool,
    workspaces: Vec<Workspace>,
    current: Option<Workspace>,
}

impl State {
    fn disable(&mut self) {
        self.enabled = false;
        self.workspaces.clear();
        self.current = None;
    }
}

/// Clears the in-flight flag when a load finishes, however it finishes.
struct LoadGuard<'a>(&'a AtomicBool);

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct WorkspaceResolver {
    api: Arc<dyn WorkspaceApi>,
    storage: Arc<dyn ClientStorage>,
    state: RwLock<State>,
    loading: AtomicBool,
}

impl WorkspaceResolver {
    pub fn new(api: Arc<dyn WorkspaceApi>, storage: Arc<dyn ClientStorage>) -> Self {
        Self {
            api,
            storage,
            state: RwLock::new(State::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Record the current session. Signing out drops the loaded list but
    /// keeps the persisted selection for the next sign-in.
    pub async fn set_auth(&self, auth: AuthSnapshot) {
        let mut state = self.state.write().await;
        if !auth.is_authenticated {
            state.disable();
        }
        state.auth = auth;
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.read().await.enabled
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn workspaces(&self) -> Vec<Workspace> {
        self.state.read().await.workspaces.clone()
    }

    pub async fn current_workspace(&self) -> Option<Workspace> {
        self.state.read().await.current.clone()
    }

    /// Workspace id to attach to scoped API calls. `None` when the mode is
    /// off or nothing is selected.
    pub async fn workspace_filter_param(&self) -> Option<WorkspaceId> {
        let state = self.state.read().await;
        if !state.enabled {
            return None;
        }
        state.current.as_ref().map(|w| w.id)
    }

    async fn organization(&self) -> Option<OrganizationId> {
        let auth = self.state.read().await.auth;
        resolve_organization_id(&auth, self.storage.as_ref())
    }

    async fn require_organization(&self) -> Result<OrganizationId, ResolverError> {
        self.organization().await.ok_or(ResolverError::NoOrganization)
    }

    fn stored_selection(&self) -> Option<WorkspaceId> {
        match self.storage.get(CURRENT_WORKSPACE_KEY) {
            Ok(Some(raw)) => raw.parse().ok(),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("failed to read workspace selection: {err}");
                None
            }
        }
    }

    fn persist_selection(&self, id: Option<WorkspaceId>) {
        let result = match id {
            Some(id) => self.storage.set(CURRENT_WORKSPACE_KEY, &id.to_string()),
            None => self.storage.remove(CURRENT_WORKSPACE_KEY),
        };
        if let Err(err) = result {
            tracing::warn!("failed to persist workspace selection: {err}");
        }
    }

    /// Load settings and workspaces for the session's organization.
    ///
    /// Does nothing while another load is in flight or without an
    /// authenticated session and organization. A 401 is returned as
    /// [`ResolverError::Unauthorized`]; any other failure turns the mode off.
    pub async fn refresh_workspaces(&self) -> Result<(), ResolverError> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            tracing::debug!("workspace load already in flight");
            return Ok(());
        };

        let auth = self.state.read().await.auth;
        if !auth.is_authenticated {
            return Ok(());
        }
        let Some(org) = resolve_organization_id(&auth, self.storage.as_ref()) else {
            return Ok(());
        };

        let loaded = match self.load(org).await {
            Ok(loaded) => loaded,
            Err(err) if err.is_unauthorized() => {
                return Err(ResolverError::Unauthorized(err));
            }
            Err(err) => {
                tracing::warn!(%org, "workspace load failed, disabling multi-workspace: {err}");
                self.state.write().await.disable();
                return Ok(());
            }
        };

        let mut state = self.state.write().await;
        let Some(workspaces) = loaded else {
            state.disable();
            return Ok(());
        };

        let stored = self.stored_selection();
        let current = stored
            .and_then(|id| workspaces.iter().find(|w| w.id == id))
            .or_else(|| workspaces.first())
            .cloned();
        if current.as_ref().map(|w| w.id) != stored {
            self.persist_selection(current.as_ref().map(|w| w.id));
        }

        tracing::info!(%org, count = workspaces.len(), current = ?current.as_ref().map(|w| w.id), "workspaces loaded");
        state.enabled = true;
        state.workspaces = workspaces;
        state.current = current;
        Ok(())
    }

    /// `None` when the organization has the mode off.
    async fn load(&self, org: OrganizationId) -> Result<Option<Vec<Workspace>>, ClientError> {
        let settings = self.api.settings(org).await?;
        if !settings.enabled {
            return Ok(None);
        }
        self.api.list(org).await.map(Some)
    }

    /// Select `id`, or clear the selection with `None`.
    pub async fn set_current_workspace(&self, id: Option<WorkspaceId>) -> Result<(), ResolverError> {
        let mut state = self.state.write().await;
        let next = match id {
            Some(id) => Some(
                state
                    .workspaces
                    .iter()
                    .find(|w| w.id == id)
                    .cloned()
                    .ok_or(ResolverError::UnknownWorkspace(id))?,
            ),
            None => None,
        };
        self.persist_selection(id);
        state.current = next;
        Ok(())
    }

    /// Create a workspace. It becomes current when nothing is selected.
    pub async fn create_workspace(&self, input: &CreateWorkspace) -> Result<Workspace, ResolverError> {
        let org = self.require_organization().await?;
        let created = self.api.create(org, input).await?;

        let mut state = self.state.write().await;
        state.workspaces.push(created.clone());
        if state.current.is_none() {
            self.persist_selection(Some(created.id));
            state.current = Some(created.clone());
        }
        Ok(created)
    }

    pub async fn update_workspace(
        &self,
        id: WorkspaceId,
        input: &UpdateWorkspace,
    ) -> Result<Workspace, ResolverError> {
        let org = self.require_organization().await?;
        let updated = self.api.update(org, id, input).await?;

        let mut state = self.state.write().await;
        if let Some(slot) = state.workspaces.iter_mut().find(|w| w.id == id) {
            *slot = updated.clone();
        }
        if state.current.as_ref().is_some_and(|w| w.id == id) {
            state.current = Some(updated.clone());
        }
        Ok(updated)
    }

    /// Delete a workspace. Deleting the current one moves the selection to
    /// the first remaining active workspace, or clears it.
    pub async fn delete_workspace(&self, id: WorkspaceId) -> Result<(), ResolverError> {
        let org = self.require_organization().await?;
        self.api.delete(org, id).await?;

        let mut state = self.state.write().await;
        state.workspaces.retain(|w| w.id != id);
        if state.current.as_ref().is_some_and(|w| w.id == id) {
            let next = state.workspaces.iter().find(|w| w.is_active()).cloned();
            self.persist_selection(next.as_ref().map(|w| w.id));
            state.current = next;
        }
        Ok(())
    }

    pub async fn enable_multi_workspace(&self) -> Result<(), ResolverError> {
        let org = self.require_organization().await?;
        self.api.enable(org).await?;
        tracing::info!(%org, "multi-workspace enabled");
        self.refresh_workspaces().await
    }

    /// Turn the mode off for the organization and forget the selection.
    pub async fn disable_multi_workspace(&self) -> Result<(), ResolverError> {
        let org = self.require_organization().await?;
        self.api.disable(org).await?;
        self.state.write().await.disable();
        tracing::info!(%org, "multi-workspace disabled");
        self.storage.remove(CURRENT_WORKSPACE_KEY)?;
        Ok(())
    }

    /// Drop in-memory state and the persisted selection.
    pub async fn clear_selection(&self) -> Result<(), ResolverError> {
        self.state.write().await.disable();
        self.storage.remove(CURRENT_WORKSPACE_KEY)?;
        Ok(())
    }
}
