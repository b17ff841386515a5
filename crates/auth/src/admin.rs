//! Administrator detection.
//!
//! The backend has no explicit admin flag; membership of a group literally
//! named "Administrator" is what marks an administrator. That rule is kept
//! here, behind [`AdminPolicy`], and resolved once into
//! [`UserPermissions::is_admin`](crate::UserPermissions).

use crate::Role;

pub trait AdminPolicy: Send + Sync {
    fn is_admin(&self, role: &Role, groups: &[String]) -> bool;
}

/// Admin iff one of the user's groups has exactly this name.
#[derive(Debug, Clone)]
pub struct GroupNameAdminPolicy {
    group_name: String,
}

impl GroupNameAdminPolicy {
    pub const DEFAULT_GROUP: &'static str = "Administrator";

    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
        }
    }
}

impl Default for GroupNameAdminPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GROUP)
    }
}

impl AdminPolicy for GroupNameAdminPolicy {
    fn is_admin(&self, _role: &Role, groups: &[String]) -> bool {
        groups.iter().any(|g| *g == self.group_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_group_name_only() {
        let policy = GroupNameAdminPolicy::default();
        let role = Role::new("member");
        assert!(policy.is_admin(&role, &["Auditors".into(), "Administrator".into()]));
        assert!(!policy.is_admin(&role, &["Administrators".into()]));
        assert!(!policy.is_admin(&role, &["administrator".into()]));
        assert!(!policy.is_admin(&Role::new("admin"), &[]));
    }
}
