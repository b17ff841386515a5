use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use grc_core::{OrganizationId, UserId};

/// Verb a permission grants on a resource (e.g. "read", "approve").
///
/// Verbs are opaque strings; the backend owns the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(Cow<'static, str>);

impl Action {
    pub const READ: Action = Action(Cow::Borrowed("read"));
    pub const CREATE: Action = Action(Cow::Borrowed("create"));
    pub const UPDATE: Action = Action(Cow::Borrowed("update"));
    pub const DELETE: Action = Action(Cow::Borrowed("delete"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Organization role of a user (e.g. "admin", "risk_manager").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which records of a resource a permission reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    #[default]
    All,
    Owned,
    Assigned,
}

impl Ownership {
    /// `Owned` and `Assigned` restrict access to the user's own records.
    pub fn is_restricted(self) -> bool {
        !matches!(self, Ownership::All)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionScope {
    #[serde(default)]
    pub ownership: Ownership,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Where an effective permission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionOrigin {
    Group,
    Override,
}

/// One contributing grant on a resource.
///
/// A user may hold several entries for the same resource, one per group or
/// override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermission {
    pub resource: String,
    pub actions: BTreeSet<Action>,
    #[serde(default)]
    pub scope: PermissionScope,
    #[serde(rename = "source")]
    pub origin: PermissionOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl EffectivePermission {
    pub fn allows(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a.as_str() == action)
    }
}

/// Resolved permission set of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPermissions {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub role: Role,
    pub groups: Vec<String>,
    pub permissions: Vec<EffectivePermission>,
    /// Administrator capability, decided once at load time by an
    /// [`AdminPolicy`](crate::AdminPolicy).
    pub is_admin: bool,
}

impl UserPermissions {
    /// First entry for `resource`, in backend order.
    ///
    /// Later entries for the same resource are ignored; actions are not
    /// merged across groups.
    pub fn first_for(&self, resource: &str) -> Option<&EffectivePermission> {
        self.permissions.iter().find(|p| p.resource == resource)
    }
}
