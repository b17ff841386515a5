//! In-memory workspace backend for tests and offline hosts.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use grc_client::ClientError;
use grc_core::{OrganizationId, WorkspaceId};

use crate::api::WorkspaceApi;
use crate::model::{CreateWorkspace, UpdateWorkspace, Workspace, WorkspaceSettings, WorkspaceStatus};

#[derive(Debug, Default)]
struct Inner {
    enabled: bool,
    workspaces: Vec<Workspace>,
    /// Returned (once) by the next `settings` call.
    next_settings_error: Option<ClientError>,
}

#[derive(Debug, Default)]
pub struct InMemoryWorkspaceApi {
    inner: Mutex<Inner>,
    settings_calls: AtomicU32,
}

impl InMemoryWorkspaceApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspaces(enabled: bool, workspaces: Vec<Workspace>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                enabled,
                workspaces,
                next_settings_error: None,
            }),
            settings_calls: AtomicU32::new(0),
        }
    }

    pub fn fail_next_settings(&self, err: ClientError) {
        self.lock().next_settings_error = Some(err);
    }

    pub fn settings_calls(&self) -> u32 {
        self.settings_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl WorkspaceApi for InMemoryWorkspaceApi {
    async fn settings(&self, _org: OrganizationId) -> Result<WorkspaceSettings, ClientError> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent loads can observe an in-flight request.
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        match inner.next_settings_error.take() {
            Some(err) => Err(err),
            None => Ok(WorkspaceSettings {
                enabled: inner.enabled,
            }),
        }
    }

    async fn list(&self, org: OrganizationId) -> Result<Vec<Workspace>, ClientError> {
        Ok(self
            .lock()
            .workspaces
            .iter()
            .filter(|w| w.organization_id == org)
            .cloned()
            .collect())
    }

    async fn create(&self, org: OrganizationId, input: &CreateWorkspace) -> Result<Workspace, ClientError> {
        let workspace = Workspace {
            id: WorkspaceId::new(),
            organization_id: org,
            name: input.name.clone(),
            description: input.description.clone(),
            status: WorkspaceStatus::Active,
        };
        self.lock().workspaces.push(workspace.clone());
        Ok(workspace)
    }

    async fn update(
        &self,
        org: OrganizationId,
        id: WorkspaceId,
        input: &UpdateWorkspace,
    ) -> Result<Workspace, ClientError> {
        let mut inner = self.lock();
        let workspace = inner
            .workspaces
            .iter_mut()
            .find(|w| w.id == id && w.organization_id == org)
            .ok_or_else(|| ClientError::http(404, None))?;
        input.apply_to(workspace);
        Ok(workspace.clone())
    }

    async fn delete(&self, org: OrganizationId, id: WorkspaceId) -> Result<(), ClientError> {
        let mut inner = self.lock();
        let before = inner.workspaces.len();
        inner
            .workspaces
            .retain(|w| !(w.id == id && w.organization_id == org));
        if inner.workspaces.len() == before {
            return Err(ClientError::http(404, None));
        }
        Ok(())
    }

    async fn enable(&self, _org: OrganizationId) -> Result<(), ClientError> {
        self.lock().enabled = true;
        Ok(())
    }

    async fn disable(&self, _org: OrganizationId) -> Result<(), ClientError> {
        self.lock().enabled = false;
        Ok(())
    }
}
