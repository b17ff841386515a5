//! External auditor portal session, persisted in session storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grc_core::{ClientStorage, OrganizationId, StorageError};

pub const AUDITOR_SESSION_KEY: &str = "auditor_session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditorSession {
    pub token: String,
    pub auditor_id: String,
    pub email: String,
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub audit_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl AuditorSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Reads and writes the auditor session under [`AUDITOR_SESSION_KEY`].
#[derive(Debug, Clone)]
pub struct AuditorSessionStore<S> {
    storage: S,
}

impl<S: ClientStorage> AuditorSessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The stored session, if present and unexpired at `now`.
    ///
    /// Expired or unreadable sessions are removed.
    pub fn load_at(&self, now: DateTime<Utc>) -> Result<Option<AuditorSession>, StorageError> {
        let session = match self.storage.get_json::<AuditorSession>(AUDITOR_SESSION_KEY) {
            Ok(session) => session,
            Err(StorageError::Corrupt { .. }) => {
                tracing::warn!("discarding unreadable auditor session");
                self.storage.remove(AUDITOR_SESSION_KEY)?;
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        match session {
            Some(s) if s.is_expired_at(now) => {
                tracing::info!(auditor_id = %s.auditor_id, "auditor session expired");
                self.storage.remove(AUDITOR_SESSION_KEY)?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub fn load(&self) -> Result<Option<AuditorSession>, StorageError> {
        self.load_at(Utc::now())
    }

    pub fn save(&self, session: &AuditorSession) -> Result<(), StorageError> {
        self.storage.set_json(AUDITOR_SESSION_KEY, session)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(AUDITOR_SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use grc_core::MemoryStorage;

    fn session(expires_at: DateTime<Utc>) -> AuditorSession {
        AuditorSession {
            token: "tok".into(),
            auditor_id: "aud-1".into(),
            email: "auditor@example.com".into(),
            organization_id: OrganizationId::new(),
            audit_id: Some("soc2-2026".into()),
            expires_at,
        }
    }

    #[test]
    fn unexpired_session_is_restored() {
        let now = Utc::now();
        let store = AuditorSessionStore::new(MemoryStorage::new());
        let s = session(now + Duration::hours(1));
        store.save(&s).unwrap();
        assert_eq!(store.load_at(now).unwrap(), Some(s));
    }

    #[test]
    fn expired_session_is_removed() {
        let now = Utc::now();
        let storage = MemoryStorage::new();
        let store = AuditorSessionStore::new(storage.clone());
        store.save(&session(now - Duration::seconds(1))).unwrap();

        assert_eq!(store.load_at(now).unwrap(), None);
        assert_eq!(storage.get(AUDITOR_SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn unreadable_session_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set(AUDITOR_SESSION_KEY, "{\"token\":").unwrap();
        let store = AuditorSessionStore::new(storage.clone());

        assert_eq!(store.load().unwrap(), None);
        assert_eq!(storage.get(AUDITOR_SESSION_KEY).unwrap(), None);
    }
}
