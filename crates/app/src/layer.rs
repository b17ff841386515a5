//! The composed policy layer and its lifecycle.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;

use grc_auth::{
    AuditorSession, AuditorSessionStore, GateDecision, GroupNameAdminPolicy, HttpPermissionFetcher,
    PermissionFetcher, PermissionGate, PermissionRequirement, PermissionResolver,
};
use grc_client::{ApiClient, ClientError, RetryConfig, RetryMutation, ToastSink, Toaster, TracingSink};
use grc_core::{ClientStorage, OrganizationId, UserId};
use grc_modules::{HttpOrgModuleFetcher, ModuleGate, OrgModuleFetcher};
use grc_workspace::{AuthSnapshot, HttpWorkspaceApi, WorkspaceApi, WorkspaceResolver};

use crate::config::PolicyConfig;

/// Collaborators the layer talks to.
pub struct PolicyDeps {
    pub permissions: Arc<dyn PermissionFetcher>,
    pub org_modules: Arc<dyn OrgModuleFetcher>,
    pub workspaces: Arc<dyn WorkspaceApi>,
    /// Survives reloads: workspace selection, organization id.
    pub local_storage: Arc<dyn ClientStorage>,
    /// Per-tab: auditor session.
    pub session_storage: Arc<dyn ClientStorage>,
    pub toasts: Arc<dyn ToastSink>,
}

impl PolicyDeps {
    /// REST adapters sharing one client; toasts go to the log.
    pub fn http(
        config: &PolicyConfig,
        local_storage: Arc<dyn ClientStorage>,
        session_storage: Arc<dyn ClientStorage>,
    ) -> anyhow::Result<Self> {
        let client = ApiClient::new(config.api.clone()).context("failed to build API client")?;
        Ok(Self {
            permissions: Arc::new(HttpPermissionFetcher::new(client.clone())),
            org_modules: Arc::new(HttpOrgModuleFetcher::new(client.clone())),
            workspaces: Arc::new(HttpWorkspaceApi::new(client)),
            local_storage,
            session_storage,
            toasts: Arc::new(TracingSink),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
}

pub struct PolicyLayer {
    permissions: PermissionResolver,
    modules: ModuleGate,
    workspaces: WorkspaceResolver,
    auditor: AuditorSessionStore<Arc<dyn ClientStorage>>,
    toaster: Toaster,
    org_modules: Arc<dyn OrgModuleFetcher>,
    retry: RetryConfig,
    session: Option<Session>,
}

impl PolicyLayer {
    pub fn init(config: PolicyConfig, deps: PolicyDeps) -> Self {
        if let Some(logging) = &config.logging {
            grc_observability::init_with(logging);
        }

        for issue in config.modules.issues() {
            tracing::warn!("module configuration: {issue}");
        }

        let mut permissions = PermissionResolver::new(deps.permissions);
        if let Some(group) = config.admin_group {
            permissions = permissions.with_admin_policy(Arc::new(GroupNameAdminPolicy::new(group)));
        }

        let modules = match config.module_override {
            Some(pinned) => {
                tracing::info!(modules = ?pinned, "module override active");
                ModuleGate::with_override(config.modules, pinned)
            }
            None => ModuleGate::new(config.modules),
        };

        Self {
            permissions,
            modules,
            workspaces: WorkspaceResolver::new(deps.workspaces, deps.local_storage),
            auditor: AuditorSessionStore::new(deps.session_storage),
            toaster: Toaster::new(deps.toasts),
            org_modules: deps.org_modules,
            retry: config.retry,
            session: None,
        }
    }

    /// Load everything scoped to `session`.
    ///
    /// Permission and module failures degrade in place (deny and keep the
    /// current module set). Only a rejected session is returned as an error.
    pub async fn sign_in(&mut self, session: Session) -> anyhow::Result<()> {
        tracing::info!(user_id = %session.user_id, org = %session.organization_id, "policy layer signing in");
        self.session = Some(session);

        self.workspaces
            .set_auth(AuthSnapshot::signed_in(session.organization_id))
            .await;
        self.permissions.refresh(session.user_id).await;
        self.modules
            .sync_from_org(self.org_modules.as_ref(), session.organization_id)
            .await;
        self.workspaces
            .refresh_workspaces()
            .await
            .context("failed to load workspaces")?;
        Ok(())
    }

    /// Drop all session-scoped state: cached permissions, the workspace
    /// selection and any auditor session.
    pub async fn teardown(&mut self) -> anyhow::Result<()> {
        self.permissions.invalidate();
        self.workspaces.set_auth(AuthSnapshot::signed_out()).await;
        self.session = None;

        self.workspaces
            .clear_selection()
            .await
            .context("failed to clear workspace selection")?;
        self.auditor
            .clear()
            .context("failed to clear auditor session")?;
        tracing::info!("policy layer torn down");
        Ok(())
    }

    /// Whether `path` may be shown: its module must be enabled and, when
    /// given, the permission requirement must hold.
    pub fn can_view_route(&self, path: &str, requirement: Option<&PermissionRequirement>) -> GateDecision {
        if !self.modules.is_route_enabled(path) {
            return GateDecision::Deny;
        }
        match requirement {
            Some(req) => PermissionGate::evaluate(&self.permissions, req),
            None => GateDecision::Allow,
        }
    }

    /// Wrap a backend mutation with the layer's retry policy.
    pub fn mutation<V, T, F, Fut>(&self, f: F) -> RetryMutation<V, T, ClientError, F>
    where
        V: Clone,
        F: Fn(V) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        RetryMutation::with_config(f, self.retry.clone())
    }

    /// Show a failure to the user as a normalized toast.
    pub fn report_error(&self, title: &str, err: &ClientError) {
        self.toaster.error(title, err);
    }

    /// Unexpired auditor session, if any. Storage failures read as none.
    pub fn auditor_session(&self) -> Option<AuditorSession> {
        self.auditor.load().unwrap_or_else(|err| {
            tracing::warn!("failed to read auditor session: {err}");
            None
        })
    }

    pub fn auditor_sessions(&self) -> &AuditorSessionStore<Arc<dyn ClientStorage>> {
        &self.auditor
    }

    pub fn session(&self) -> Option<Session> {
        self.session
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    pub fn modules(&self) -> &ModuleGate {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ModuleGate {
        &mut self.modules
    }

    pub fn workspaces(&self) -> &WorkspaceResolver {
        &self.workspaces
    }

    pub fn toaster(&self) -> &Toaster {
        &self.toaster
    }
}
