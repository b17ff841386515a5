//! Backend contract for workspaces.

use async_trait::async_trait;

use grc_client::{ApiClient, ClientError};
use grc_core::{OrganizationId, WorkspaceId};

use crate::model::{CreateWorkspace, UpdateWorkspace, Workspace, WorkspaceSettings};

#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    async fn settings(&self, org: OrganizationId) -> Result<WorkspaceSettings, ClientError>;
    async fn list(&self, org: OrganizationId) -> Result<Vec<Workspace>, ClientError>;
    async fn create(&self, org: OrganizationId, input: &CreateWorkspace) -> Result<Workspace, ClientError>;
    async fn update(
        &self,
        org: OrganizationId,
        id: WorkspaceId,
        input: &UpdateWorkspace,
    ) -> Result<Workspace, ClientError>;
    async fn delete(&self, org: OrganizationId, id: WorkspaceId) -> Result<(), ClientError>;
    async fn enable(&self, org: OrganizationId) -> Result<(), ClientError>;
    async fn disable(&self, org: OrganizationId) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpWorkspaceApi {
    client: ApiClient,
}

impl HttpWorkspaceApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn base(org: OrganizationId) -> String {
    format!("/organizations/{org}/workspaces")
}

#[async_trait]
impl WorkspaceApi for HttpWorkspaceApi {
    async fn settings(&self, org: OrganizationId) -> Result<WorkspaceSettings, ClientError> {
        self.client.get_json(&format!("{}/settings", base(org)), &[]).await
    }

    async fn list(&self, org: OrganizationId) -> Result<Vec<Workspace>, ClientError> {
        self.client.get_json(&base(org), &[]).await
    }

    async fn create(&self, org: OrganizationId, input: &CreateWorkspace) -> Result<Workspace, ClientError> {
        self.client.post_json(&base(org), input).await
    }

    async fn update(
        &self,
        org: OrganizationId,
        id: WorkspaceId,
        input: &UpdateWorkspace,
    ) -> Result<Workspace, ClientError> {
        self.client
            .patch_json(&format!("{}/{id}", base(org)), input)
            .await
    }

    async fn delete(&self, org: OrganizationId, id: WorkspaceId) -> Result<(), ClientError> {
        self.client.delete(&format!("{}/{id}", base(org))).await
    }

    async fn enable(&self, org: OrganizationId) -> Result<(), ClientError> {
        self.client.post_empty(&format!("{}/enable", base(org))).await
    }

    async fn disable(&self, org: OrganizationId) -> Result<(), ClientError> {
        self.client.post_empty(&format!("{}/disable", base(org))).await
    }
}
