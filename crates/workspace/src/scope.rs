//! Authentication snapshot and organization scoping.

use grc_core::{ClientStorage, OrganizationId};

/// Fallback organization scope written by the sign-in flow.
pub const ORGANIZATION_ID_KEY: &str = "organizationId";

/// What the workspace layer needs to know about the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_authenticated: bool,
    pub organization_id: Option<OrganizationId>,
}

impl AuthSnapshot {
    pub fn signed_in(organization_id: OrganizationId) -> Self {
        Self {
            is_authenticated: true,
            organization_id: Some(organization_id),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

/// Organization of the session, falling back to the id persisted under
/// [`ORGANIZATION_ID_KEY`]. Unreadable or malformed stored ids are ignored.
pub fn resolve_organization_id(
    auth: &AuthSnapshot,
    storage: &dyn ClientStorage,
) -> Option<OrganizationId> {
    if let Some(org) = auth.organization_id {
        return Some(org);
    }
    match storage.get(ORGANIZATION_ID_KEY) {
        Ok(Some(raw)) => match raw.parse() {
            Ok(org) => Some(org),
            Err(err) => {
                tracing::warn!("ignoring stored organization id: {err}");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            tracing::warn!("failed to read stored organization id: {err}");
            None
        }
    }
}
