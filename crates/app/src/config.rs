//! Configuration of the composed layer.

use anyhow::Context;

use grc_client::{ApiClientConfig, RetryConfig};
use grc_modules::{EnvSource, ModuleConfig, ModuleId};
use grc_observability::LogConfig;

pub const API_URL_VAR: &str = "VITE_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Everything the host decides before constructing a [`PolicyLayer`].
///
/// [`PolicyLayer`]: crate::PolicyLayer
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub api: ApiClientConfig,
    pub modules: ModuleConfig,
    pub retry: RetryConfig,
    /// When set, [`PolicyLayer::init`] installs the global subscriber.
    /// Hosts that configure logging themselves leave this `None`.
    ///
    /// [`PolicyLayer::init`]: crate::PolicyLayer::init
    pub logging: Option<LogConfig>,
    /// Pins the module set, ignoring environment and organization config.
    pub module_override: Option<Vec<ModuleId>>,
    /// Group whose members are administrators.
    pub admin_group: Option<String>,
}

impl PolicyConfig {
    pub fn from_env(env: &dyn EnvSource) -> anyhow::Result<Self> {
        let base_url = env
            .var(API_URL_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            anyhow::bail!("{API_URL_VAR} must be an absolute http(s) URL, got {base_url:?}");
        }

        Ok(Self {
            api: ApiClientConfig::new(base_url),
            modules: ModuleConfig::from_env(env),
            retry: RetryConfig::default(),
            logging: None,
            module_override: None,
            admin_group: None,
        })
    }

    pub fn with_module_override(mut self, modules: impl IntoIterator<Item = ModuleId>) -> Self {
        self.module_override = Some(modules.into_iter().collect());
        self
    }

    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api = self.api.with_token(token);
        self
    }

    /// Fail on any module switch problem instead of only logging it.
    pub fn strict(self) -> anyhow::Result<Self> {
        self.modules
            .validate()
            .context("invalid module configuration")?;
        Ok(self)
    }
}
