//! Permission resolver: yes/no capability queries for the signed-in user.
//!
//! - No query ever succeeds before permissions are loaded (fail-closed).
//! - Lookup is first-match by resource; actions are not unioned across
//!   entries for the same resource.

use std::sync::Arc;

use chrono::Utc;

use grc_core::UserId;

use crate::cache::PermissionCache;
use crate::fetch::PermissionFetcher;
use crate::{AdminPolicy, EffectivePermission, GroupNameAdminPolicy, UserPermissions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionState {
    /// Nothing fetched yet for this session.
    Loading,
    Ready(Arc<UserPermissions>),
    /// The fetch failed; everything is denied until the next refresh.
    Failed(String),
}

pub struct PermissionResolver {
    fetcher: Arc<dyn PermissionFetcher>,
    admin_policy: Arc<dyn AdminPolicy>,
    cache: PermissionCache,
    state: PermissionState,
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PermissionResolver {
    pub fn new(fetcher: Arc<dyn PermissionFetcher>) -> Self {
        Self {
            fetcher,
            admin_policy: Arc::new(GroupNameAdminPolicy::default()),
            cache: PermissionCache::default(),
            state: PermissionState::Loading,
        }
    }

    pub fn with_admin_policy(mut self, policy: Arc<dyn AdminPolicy>) -> Self {
        self.admin_policy = policy;
        self
    }

    pub fn with_cache(mut self, cache: PermissionCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn state(&self) -> &PermissionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PermissionState::Loading)
    }

    pub fn permissions(&self) -> Option<&UserPermissions> {
        match &self.state {
            PermissionState::Ready(p) => Some(p),
            _ => None,
        }
    }

    /// Load permissions for `user_id`, reusing the cached set while fresh.
    pub async fn refresh(&mut self, user_id: UserId) -> &PermissionState {
        let now = Utc::now();
        if let Some(cached) = self.cache.get_fresh(user_id, now) {
            tracing::debug!(%user_id, "using cached permissions");
            self.state = PermissionState::Ready(cached);
            return &self.state;
        }

        match self.fetcher.fetch_effective_permissions(user_id).await {
            Ok(resp) => {
                let perms = Arc::new(resp.into_user_permissions(self.admin_policy.as_ref()));
                tracing::info!(
                    %user_id,
                    entries = perms.permissions.len(),
                    is_admin = perms.is_admin,
                    "permissions loaded"
                );
                self.cache.store(Arc::clone(&perms), now);
                self.state = PermissionState::Ready(perms);
            }
            Err(err) => {
                tracing::warn!(%user_id, "failed to load permissions: {err}");
                self.state = PermissionState::Failed(err.user_message());
            }
        }
        &self.state
    }

    /// Drop the session's permissions (logout).
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.state = PermissionState::Loading;
    }

    fn find(&self, resource: &str) -> Option<&EffectivePermission> {
        self.permissions().and_then(|p| p.first_for(resource))
    }

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.find(resource).is_some_and(|p| p.allows(action))
    }

    /// False when `checks` is empty.
    pub fn has_any_permission(&self, checks: &[(&str, &str)]) -> bool {
        checks.iter().any(|(r, a)| self.has_permission(r, a))
    }

    /// True when `checks` is empty, provided permissions are loaded.
    pub fn has_all_permissions(&self, checks: &[(&str, &str)]) -> bool {
        self.permissions().is_some() && checks.iter().all(|(r, a)| self.has_permission(r, a))
    }

    /// Like [`has_permission`](Self::has_permission), additionally enforcing
    /// ownership scope: an `owned`/`assigned` grant does not reach a record
    /// owned by someone else.
    pub fn can_access(
        &self,
        resource: &str,
        action: &str,
        owner_id: Option<UserId>,
        current_user_id: UserId,
    ) -> bool {
        let Some(perm) = self.find(resource) else {
            return false;
        };
        if !perm.allows(action) {
            return false;
        }
        match owner_id {
            Some(owner) if perm.scope.ownership.is_restricted() => owner == current_user_id,
            _ => true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.permissions().is_some_and(|p| p.is_admin)
    }
}
