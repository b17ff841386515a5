//! Permission gate: decides whether guarded content renders.
//!
//! Nothing renders while permissions are loading. Once loaded, the content
//! renders when the requirement holds, otherwise the fallback (if any).

use crate::{PermissionResolver, PermissionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRequirement {
    One { resource: String, action: String },
    AnyOf(Vec<(String, String)>),
    AllOf(Vec<(String, String)>),
    Admin,
}

impl PermissionRequirement {
    pub fn one(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::One {
            resource: resource.into(),
            action: action.into(),
        }
    }

    fn holds(&self, resolver: &PermissionResolver) -> bool {
        match self {
            Self::One { resource, action } => resolver.has_permission(resource, action),
            Self::AnyOf(checks) => resolver.has_any_permission(&as_refs(checks)),
            Self::AllOf(checks) => resolver.has_all_permissions(&as_refs(checks)),
            Self::Admin => resolver.is_admin(),
        }
    }
}

fn as_refs(checks: &[(String, String)]) -> Vec<(&str, &str)> {
    checks.iter().map(|(r, a)| (r.as_str(), a.as_str())).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pending,
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionGate;

impl PermissionGate {
    pub fn evaluate(resolver: &PermissionResolver, requirement: &PermissionRequirement) -> GateDecision {
        match resolver.state() {
            PermissionState::Loading => GateDecision::Pending,
            PermissionState::Failed(_) => GateDecision::Deny,
            PermissionState::Ready(_) if requirement.holds(resolver) => GateDecision::Allow,
            PermissionState::Ready(_) => GateDecision::Deny,
        }
    }

    pub fn render<T>(
        resolver: &PermissionResolver,
        requirement: &PermissionRequirement,
        content: T,
        fallback: Option<T>,
    ) -> Option<T> {
        match Self::evaluate(resolver, requirement) {
            GateDecision::Pending => None,
            GateDecision::Allow => Some(content),
            GateDecision::Deny => fallback,
        }
    }
}
