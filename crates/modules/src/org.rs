//! Organization-level module configuration.

use async_trait::async_trait;
use serde::Deserialize;

use grc_client::{ApiClient, ClientError};
use grc_core::OrganizationId;

use crate::gate::ModuleGate;

#[async_trait]
pub trait OrgModuleFetcher: Send + Sync {
    /// Module ids the organization enabled. An empty list means "no
    /// organization preference".
    async fn fetch_enabled_modules(&self, org: OrganizationId) -> Result<Vec<String>, ClientError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrgModulesResponse {
    #[serde(default)]
    enabled_modules: Vec<String>,
}

/// Reads `/organizations/{id}/modules`.
#[derive(Debug, Clone)]
pub struct HttpOrgModuleFetcher {
    client: ApiClient,
}

impl HttpOrgModuleFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrgModuleFetcher for HttpOrgModuleFetcher {
    async fn fetch_enabled_modules(&self, org: OrganizationId) -> Result<Vec<String>, ClientError> {
        let resp: OrgModulesResponse = self
            .client
            .get_json(&format!("/organizations/{org}/modules"), &[])
            .await?;
        Ok(resp.enabled_modules)
    }
}

impl ModuleGate {
    /// Fetch the organization's modules and apply them. A failed fetch leaves
    /// the enabled set as it was.
    pub async fn sync_from_org(&mut self, fetcher: &dyn OrgModuleFetcher, org: OrganizationId) {
        let modules = match fetcher.fetch_enabled_modules(org).await {
            Ok(modules) => Some(modules),
            Err(err) => {
                tracing::warn!(%org, "failed to fetch organization modules: {err}");
                None
            }
        };
        self.refresh_from_org_config(modules.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::{ModuleConfig, ModuleId};

    struct Scripted(Mutex<Vec<Result<Vec<String>, ClientError>>>);

    #[async_trait]
    impl OrgModuleFetcher for Scripted {
        async fn fetch_enabled_modules(&self, _org: OrganizationId) -> Result<Vec<String>, ClientError> {
            self.0
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ClientError::other("exhausted")))
        }
    }

    #[tokio::test]
    async fn failed_fetch_never_downgrades_modules() {
        // Popped from the back: success first, then an outage.
        let fetcher = Scripted(Mutex::new(vec![
            Err(ClientError::http(503, None)),
            Ok(vec!["risk".into(), "bcdr".into()]),
        ]));
        let mut gate = ModuleGate::new(ModuleConfig::defaults());
        let org = OrganizationId::new();

        gate.sync_from_org(&fetcher, org).await;
        assert_eq!(gate.enabled_modules(), vec![ModuleId::Risk, ModuleId::Bcdr]);

        gate.sync_from_org(&fetcher, org).await;
        assert_eq!(gate.enabled_modules(), vec![ModuleId::Risk, ModuleId::Bcdr]);
    }
}
