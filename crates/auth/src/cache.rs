//! Session cache for the fetched permission set.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use grc_core::UserId;

use crate::UserPermissions;

#[derive(Debug, Clone)]
struct CachedPermissions {
    permissions: Arc<UserPermissions>,
    fetched_at: DateTime<Utc>,
}

/// Holds one user's permissions for a staleness window (5 minutes by default).
#[derive(Debug, Clone)]
pub struct PermissionCache {
    ttl: Duration,
    entry: Option<CachedPermissions>,
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new(Duration::minutes(5))
    }
}

impl PermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Cached permissions of `user_id`, unless stale at `now`.
    pub fn get_fresh(&self, user_id: UserId, now: DateTime<Utc>) -> Option<Arc<UserPermissions>> {
        self.entry
            .as_ref()
            .filter(|e| e.permissions.user_id == user_id)
            .filter(|e| now - e.fetched_at < self.ttl)
            .map(|e| Arc::clone(&e.permissions))
    }

    pub fn store(&mut self, permissions: Arc<UserPermissions>, now: DateTime<Utc>) {
        self.entry = Some(CachedPermissions {
            permissions,
            fetched_at: now,
        });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
