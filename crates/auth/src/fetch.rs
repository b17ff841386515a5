//! Fetching the effective permission set from the backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use grc_client::{ApiClient, ClientError};
use grc_core::{OrganizationId, UserId};

use crate::{AdminPolicy, EffectivePermission, Role, UserPermissions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub name: String,
}

/// Backend payload for the signed-in user's permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermissionsResponse {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub role: Role,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
    #[serde(default)]
    pub permissions: Vec<EffectivePermission>,
}

impl EffectivePermissionsResponse {
    pub fn into_user_permissions(self, admin_policy: &dyn AdminPolicy) -> UserPermissions {
        let groups: Vec<String> = self.groups.into_iter().map(|g| g.name).collect();
        let is_admin = admin_policy.is_admin(&self.role, &groups);
        UserPermissions {
            user_id: self.user_id,
            organization_id: self.organization_id,
            role: self.role,
            groups,
            permissions: self.permissions,
            is_admin,
        }
    }
}

#[async_trait]
pub trait PermissionFetcher: Send + Sync {
    async fn fetch_effective_permissions(
        &self,
        user_id: UserId,
    ) -> Result<EffectivePermissionsResponse, ClientError>;
}

/// Reads `/users/{id}/effective-permissions`.
#[derive(Debug, Clone)]
pub struct HttpPermissionFetcher {
    client: ApiClient,
}

impl HttpPermissionFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PermissionFetcher for HttpPermissionFetcher {
    async fn fetch_effective_permissions(
        &self,
        user_id: UserId,
    ) -> Result<EffectivePermissionsResponse, ClientError> {
        self.client
            .get_json(&format!("/users/{user_id}/effective-permissions"), &[])
            .await
    }
}
