use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use grc_app::{PolicyConfig, PolicyDeps, PolicyLayer, Session};
use grc_auth::{
    AUDITOR_SESSION_KEY, AuditorSession, EffectivePermissionsResponse, GateDecision, PermissionFetcher,
    PermissionRequirement,
};
use grc_client::{ClientError, MemorySink, RetryPhase, ToastKind};
use grc_core::{ClientStorage, MemoryStorage, OrganizationId, UserId, WorkspaceId};
use grc_modules::{MapEnv, ModuleId, OrgModuleFetcher};
use grc_workspace::{CURRENT_WORKSPACE_KEY, InMemoryWorkspaceApi, Workspace, WorkspaceStatus};

struct StaticPermissions(Result<serde_json::Value, ClientError>);

#[async_trait]
impl PermissionFetcher for StaticPermissions {
    async fn fetch_effective_permissions(
        &self,
        _user_id: UserId,
    ) -> Result<EffectivePermissionsResponse, ClientError> {
        let value = self.0.clone()?;
        Ok(serde_json::from_value(value)?)
    }
}

struct StaticModules(Vec<String>);

#[async_trait]
impl OrgModuleFetcher for StaticModules {
    async fn fetch_enabled_modules(&self, _org: OrganizationId) -> Result<Vec<String>, ClientError> {
        Ok(self.0.clone())
    }
}

struct Harness {
    session: Session,
    layer: PolicyLayer,
    workspaces: Arc<InMemoryWorkspaceApi>,
    local: Arc<MemoryStorage>,
    tab: Arc<MemoryStorage>,
    toasts: Arc<MemorySink>,
}

fn permissions_payload(session: Session) -> serde_json::Value {
    json!({
        "userId": session.user_id.to_string(),
        "organizationId": session.organization_id.to_string(),
        "role": "member",
        "groups": [{ "name": "Risk Team" }],
        "permissions": [{
            "resource": "risks",
            "actions": ["read", "update"],
            "scope": { "ownership": "all" },
            "source": "group",
            "groupName": "Risk Team"
        }]
    })
}

fn harness(permissions: Option<Result<serde_json::Value, ClientError>>, org_modules: &[&str]) -> Harness {
    let session = Session {
        user_id: UserId::new(),
        organization_id: OrganizationId::new(),
    };
    let workspaces = Arc::new(InMemoryWorkspaceApi::with_workspaces(
        true,
        vec![Workspace {
            id: WorkspaceId::new(),
            organization_id: session.organization_id,
            name: "Corporate".into(),
            description: None,
            status: WorkspaceStatus::Active,
        }],
    ));
    let local = Arc::new(MemoryStorage::new());
    let tab = Arc::new(MemoryStorage::new());
    let toasts = Arc::new(MemorySink::new());

    let deps = PolicyDeps {
        permissions: Arc::new(StaticPermissions(
            permissions.unwrap_or_else(|| Ok(permissions_payload(session))),
        )),
        org_modules: Arc::new(StaticModules(org_modules.iter().map(|s| s.to_string()).collect())),
        workspaces: workspaces.clone(),
        local_storage: local.clone(),
        session_storage: tab.clone(),
        toasts: toasts.clone(),
    };
    let config = PolicyConfig::from_env(&MapEnv::default()).unwrap();

    Harness {
        session,
        layer: PolicyLayer::init(config, deps),
        workspaces,
        local,
        tab,
        toasts,
    }
}

#[tokio::test]
async fn signed_in_user_sees_permitted_module_routes() {
    let mut h = harness(None, &["risk", "bcdr"]);
    let read_risks = PermissionRequirement::one("risks", "read");

    assert_eq!(h.layer.can_view_route("/risks", Some(&read_risks)), GateDecision::Pending);

    h.layer.sign_in(h.session).await.unwrap();

    assert_eq!(h.layer.can_view_route("/risks", Some(&read_risks)), GateDecision::Allow);
    assert_eq!(
        h.layer.can_view_route("/risks/7", Some(&PermissionRequirement::one("risks", "delete"))),
        GateDecision::Deny
    );
    // Vendors is a default module, but the organization list replaced it.
    assert_eq!(h.layer.can_view_route("/vendors", None), GateDecision::Deny);
    assert_eq!(h.layer.can_view_route("/bcdr", None), GateDecision::Allow);
    assert_eq!(h.layer.can_view_route("/settings/ai", None), GateDecision::Deny);
    assert_eq!(h.layer.can_view_route("/dashboard", None), GateDecision::Allow);

    let current = h.layer.workspaces().current_workspace().await.unwrap();
    assert_eq!(h.layer.workspaces().workspace_filter_param().await, Some(current.id));
}

#[tokio::test]
async fn teardown_clears_session_state() {
    let mut h = harness(None, &[]);
    h.layer.sign_in(h.session).await.unwrap();
    h.layer
        .auditor_sessions()
        .save(&AuditorSession {
            token: "tok".into(),
            auditor_id: "aud-1".into(),
            email: "auditor@example.com".into(),
            organization_id: h.session.organization_id,
            audit_id: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
        .unwrap();
    assert!(h.layer.auditor_session().is_some());
    assert!(h.local.get(CURRENT_WORKSPACE_KEY).unwrap().is_some());

    h.layer.teardown().await.unwrap();

    assert!(h.layer.permissions().is_loading());
    assert_eq!(h.layer.session(), None);
    assert_eq!(h.layer.workspaces().workspace_filter_param().await, None);
    assert_eq!(h.local.get(CURRENT_WORKSPACE_KEY).unwrap(), None);
    assert_eq!(h.tab.get(AUDITOR_SESSION_KEY).unwrap(), None);
    assert_eq!(
        h.layer.can_view_route("/risks", Some(&PermissionRequirement::one("risks", "read"))),
        GateDecision::Pending
    );
}

#[tokio::test]
async fn failed_permission_load_denies_and_toasts_normalized_message() {
    let mut h = harness(Some(Err(ClientError::http(500, None))), &[]);
    h.layer.sign_in(h.session).await.unwrap();

    assert_eq!(
        h.layer.can_view_route("/risks", Some(&PermissionRequirement::one("risks", "read"))),
        GateDecision::Deny
    );

    h.layer.report_error("Could not save", &ClientError::http(500, None));
    let toasts = h.toasts.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert_eq!(
        toasts[0].message,
        "An internal server error occurred. Please try again later."
    );
}

#[tokio::test]
async fn rejected_session_fails_sign_in() {
    let mut h = harness(None, &[]);
    h.workspaces.fail_next_settings(ClientError::http(401, None));

    let err = h.layer.sign_in(h.session).await.unwrap_err();
    assert!(format!("{err:#}").contains("failed to load workspaces"));
}

#[tokio::test(start_paused = true)]
async fn mutations_use_layer_retry_policy() {
    let h = harness(None, &[]);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let mut save = h.layer.mutation(move |name: String| {
        let counter = counter.clone();
        async move {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Err(ClientError::http(503, None)),
                _ => Ok(format!("saved {name}")),
            }
        }
    });

    assert!(save.mutate("policy".into()).await.is_err());
    assert_eq!(save.retry_state().phase, RetryPhase::FailedRetryable);

    let started = tokio::time::Instant::now();
    assert_eq!(save.manual_retry().await.unwrap(), "saved policy");
    assert!(started.elapsed() >= Duration::from_millis(1000));
    assert_eq!(save.retry_state().attempts, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn module_override_pins_the_set() {
    let config = PolicyConfig::from_env(&MapEnv::default())
        .unwrap()
        .with_module_override([ModuleId::Trust]);
    let deps = PolicyDeps {
        permissions: Arc::new(StaticPermissions(Err(ClientError::other("unused")))),
        org_modules: Arc::new(StaticModules(vec!["risk".into()])),
        workspaces: Arc::new(InMemoryWorkspaceApi::new()),
        local_storage: Arc::new(MemoryStorage::new()),
        session_storage: Arc::new(MemoryStorage::new()),
        toasts: Arc::new(MemorySink::new()),
    };
    let layer = PolicyLayer::init(config, deps);
    assert!(layer.modules().is_overridden());
    assert_eq!(layer.modules().enabled_modules(), vec![ModuleId::Trust]);
    assert_eq!(layer.can_view_route("/trust-center", None), GateDecision::Allow);
    assert_eq!(layer.can_view_route("/risks", None), GateDecision::Deny);
}
