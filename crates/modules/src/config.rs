//! Typed module configuration sourced from the environment.
//!
//! Each module has one switch, `VITE_ENABLE_<NAME>_MODULE`. A switch is on
//! only when its value is exactly `"true"` or `"1"`; any other non-empty value
//! turns it off; an absent or empty variable leaves the module at its catalog
//! default.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::catalog::{MODULE_CATALOG, ModuleId};

const SWITCH_PREFIX: &str = "VITE_ENABLE_";
const SWITCH_SUFFIX: &str = "_MODULE";

/// Read access to environment variables.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;

    /// Every variable name visible to the source.
    fn names(&self) -> Vec<String>;
}

/// The process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn names(&self) -> Vec<String> {
        std::env::vars_os()
            .filter_map(|(k, _)| k.into_string().ok())
            .collect()
    }
}

/// Fixed map of variables.
#[derive(Debug, Default, Clone)]
pub struct MapEnv(pub HashMap<String, String>);

impl MapEnv {
    pub fn new<K: Into<String>, V: Into<String>>(vars: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a recognized flag value (use \"true\" or \"1\")")]
    UnrecognizedFlag { var: String, value: String },

    #[error("{0} does not match any known module")]
    UnknownSwitch(String),
}

/// Resolved state of one module switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSetting {
    pub id: ModuleId,
    pub env_var: &'static str,
    pub raw: Option<String>,
    pub enabled: bool,
}

/// Environment-derived module defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    settings: Vec<ModuleSetting>,
    issues: Vec<ConfigError>,
}

/// `Some(true)` for "true"/"1", `Some(false)` for other non-empty values,
/// `None` when absent or empty.
pub fn parse_switch(raw: Option<&str>) -> Option<bool> {
    match raw {
        None | Some("") => None,
        Some("true") | Some("1") => Some(true),
        Some(_) => Some(false),
    }
}

impl ModuleConfig {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let mut issues = Vec::new();

        let settings = MODULE_CATALOG
            .iter()
            .map(|def| {
                let raw = env.var(def.env_var);
                let enabled = parse_switch(raw.as_deref()).unwrap_or(def.default_enabled);
                if let Some(value) = raw.as_deref() {
                    if !matches!(value, "" | "true" | "1" | "false" | "0") {
                        issues.push(ConfigError::UnrecognizedFlag {
                            var: def.env_var.to_string(),
                            value: value.to_string(),
                        });
                    }
                }
                ModuleSetting {
                    id: def.id,
                    env_var: def.env_var,
                    raw,
                    enabled,
                }
            })
            .collect();

        let mut unknown: Vec<String> = env
            .names()
            .into_iter()
            .filter(|n| n.starts_with(SWITCH_PREFIX) && n.ends_with(SWITCH_SUFFIX))
            .filter(|n| !MODULE_CATALOG.iter().any(|d| d.env_var == n.as_str()))
            .collect();
        unknown.sort();
        issues.extend(unknown.into_iter().map(ConfigError::UnknownSwitch));

        Self { settings, issues }
    }

    /// Catalog defaults only, ignoring the environment.
    pub fn defaults() -> Self {
        Self::from_env(&MapEnv::default())
    }

    pub fn settings(&self) -> &[ModuleSetting] {
        &self.settings
    }

    pub fn enabled_set(&self) -> BTreeSet<ModuleId> {
        self.settings
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.id)
            .collect()
    }

    /// Problems found while reading the environment. The configuration is
    /// still usable; offending switches fell back as described above.
    pub fn issues(&self) -> &[ConfigError] {
        &self.issues
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.issues.first() {
            Some(issue) => Err(issue.clone()),
            None => Ok(()),
        }
    }
}
