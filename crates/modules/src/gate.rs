//! The module gate: the enabled set and every visibility question asked of it.

use std::collections::BTreeSet;

use crate::catalog::{MODULE_CATALOG, MODULE_PRESETS, ModuleId, ModulePreset, route_matches};
use crate::config::ModuleConfig;

/// Base paths that never depend on a module.
const ALWAYS_ALLOWED: &[&str] = &[
    "/dashboard",
    "/login",
    "/settings",
    "/account",
    "/help",
    "/docs",
    "/users",
    "/permissions",
];

/// Settings pages owned by a module, checked before [`ALWAYS_ALLOWED`].
const GATED_SETTINGS: &[(&str, ModuleId)] = &[
    ("/settings/ai", ModuleId::Ai),
    ("/settings/mcp", ModuleId::Mcp),
    ("/settings/config-as-code", ModuleId::ConfigAsCode),
];

const ALWAYS_VISIBLE_SECTION: &str = "Settings";

#[derive(Debug, Clone)]
pub struct ModuleGate {
    config: ModuleConfig,
    enabled: BTreeSet<ModuleId>,
    /// Authoritative for the gate's lifetime when set.
    override_modules: Option<BTreeSet<ModuleId>>,
}

impl ModuleGate {
    pub fn new(config: ModuleConfig) -> Self {
        let enabled = config.enabled_set();
        tracing::debug!(?enabled, "module gate initialized from environment");
        Self {
            config,
            enabled,
            override_modules: None,
        }
    }

    /// Gate pinned to exactly `modules`, ignoring environment and organization
    /// configuration.
    pub fn with_override(config: ModuleConfig, modules: impl IntoIterator<Item = ModuleId>) -> Self {
        let pinned: BTreeSet<ModuleId> = modules.into_iter().collect();
        Self {
            config,
            enabled: pinned.clone(),
            override_modules: Some(pinned),
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.override_modules.is_some()
    }

    pub fn is_module_enabled(&self, id: ModuleId) -> bool {
        self.enabled.contains(&id)
    }

    pub fn is_route_enabled(&self, path: &str) -> bool {
        if let Some((_, owner)) = GATED_SETTINGS.iter().find(|(prefix, _)| path.starts_with(prefix)) {
            return self.is_module_enabled(*owner);
        }

        if path == "/" || ALWAYS_ALLOWED.iter().any(|base| route_matches(path, base)) {
            return true;
        }

        self.enabled
            .iter()
            .any(|id| id.definition().owns_route(path))
    }

    pub fn is_nav_section_enabled(&self, name: &str) -> bool {
        name == ALWAYS_VISIBLE_SECTION
            || self
                .enabled
                .iter()
                .any(|id| id.definition().nav_sections.iter().any(|s| *s == name))
    }

    /// Enabled modules in catalog order.
    pub fn enabled_modules(&self) -> Vec<ModuleId> {
        MODULE_CATALOG
            .iter()
            .map(|d| d.id)
            .filter(|id| self.enabled.contains(id))
            .collect()
    }

    pub fn disabled_modules(&self) -> Vec<ModuleId> {
        MODULE_CATALOG
            .iter()
            .map(|d| d.id)
            .filter(|id| !self.enabled.contains(id))
            .collect()
    }

    /// First preset whose module set equals the enabled set, `None` for a
    /// custom combination.
    pub fn active_preset(&self) -> Option<&'static ModulePreset> {
        MODULE_PRESETS.iter().find(|preset| {
            let modules: BTreeSet<ModuleId> = preset.modules.iter().copied().collect();
            modules == self.enabled
        })
    }

    /// Apply the organization's module list.
    ///
    /// - override active: ignored
    /// - non-empty list: enabled set becomes exactly the known ids in it
    /// - empty list: back to environment defaults
    /// - `None` (fetch failed or pending): enabled set untouched, so a
    ///   transient outage never disables a working module
    pub fn refresh_from_org_config(&mut self, org_modules: Option<&[String]>) {
        if self.override_modules.is_some() {
            tracing::debug!("module override active; ignoring organization config");
            return;
        }

        match org_modules {
            None => {
                tracing::debug!("no organization module config; keeping current set");
            }
            Some([]) => {
                self.enabled = self.config.enabled_set();
                tracing::info!(enabled = ?self.enabled, "organization config empty; using environment defaults");
            }
            Some(ids) => {
                let mut next = BTreeSet::new();
                for raw in ids {
                    match raw.parse::<ModuleId>() {
                        Ok(id) => {
                            next.insert(id);
                        }
                        Err(_) => tracing::warn!(module = %raw, "ignoring unknown module from organization config"),
                    }
                }
                tracing::info!(enabled = ?next, "module set replaced from organization config");
                self.enabled = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::config::MapEnv;

    fn env_gate(vars: &[(&str, &str)]) -> ModuleGate {
        ModuleGate::new(ModuleConfig::from_env(&MapEnv::new(vars.iter().copied())))
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn override_is_authoritative() {
        let config = ModuleConfig::from_env(&MapEnv::new([("VITE_ENABLE_BCDR_MODULE", "true")]));
        let mut gate = ModuleGate::with_override(config, [ModuleId::Risk]);

        for id in ModuleId::ALL {
            assert_eq!(gate.is_module_enabled(id), id == ModuleId::Risk, "{id}");
        }

        gate.refresh_from_org_config(Some(&strings(&["compliance", "audit"])));
        gate.refresh_from_org_config(Some(&[]));
        assert_eq!(gate.enabled_modules(), vec![ModuleId::Risk]);
    }

    #[test]
    fn missing_org_config_leaves_set_untouched() {
        let mut gate = env_gate(&[]);
        gate.refresh_from_org_config(Some(&strings(&["risk", "bcdr"])));
        let before = gate.enabled_modules();

        gate.refresh_from_org_config(None);
        assert_eq!(gate.enabled_modules(), before);
    }

    #[test]
    fn org_list_is_intersected_with_catalog() {
        let mut gate = env_gate(&[]);
        gate.refresh_from_org_config(Some(&strings(&["bcdr", "payroll", "trust"])));
        assert_eq!(gate.enabled_modules(), vec![ModuleId::Bcdr, ModuleId::Trust]);
        assert!(!gate.is_module_enabled(ModuleId::Risk));
    }

    #[test]
    fn empty_org_list_resets_to_environment_defaults() {
        let mut gate = env_gate(&[("VITE_ENABLE_AI_MODULE", "1")]);
        let env_defaults = gate.enabled_modules();
        gate.refresh_from_org_config(Some(&strings(&["bcdr"])));
        assert_ne!(gate.enabled_modules(), env_defaults);

        gate.refresh_from_org_config(Some(&[]));
        assert_eq!(gate.enabled_modules(), env_defaults);
    }

    #[test]
    fn settings_subpages_are_gated_by_their_module() {
        let off = ModuleGate::with_override(ModuleConfig::defaults(), [ModuleId::Risk]);
        let on = ModuleGate::with_override(
            ModuleConfig::defaults(),
            [ModuleId::Ai, ModuleId::Mcp, ModuleId::ConfigAsCode],
        );

        for path in ["/settings/ai", "/settings/ai/foo", "/settings/mcp/servers", "/settings/config-as-code"] {
            assert!(!off.is_route_enabled(path), "{path}");
            assert!(on.is_route_enabled(path), "{path}");
        }
        assert!(off.is_route_enabled("/settings"));
        assert!(off.is_route_enabled("/settings/profile"));
    }

    #[test]
    fn base_paths_are_always_allowed() {
        let gate = ModuleGate::with_override(ModuleConfig::defaults(), []);
        for path in ["/", "/dashboard", "/login", "/account/security", "/help", "/docs/api", "/users/7", "/permissions"] {
            assert!(gate.is_route_enabled(path), "{path}");
        }
        assert!(!gate.is_route_enabled("/risks"));
        assert!(!gate.is_route_enabled("/dashboards"));
    }

    #[test]
    fn module_routes_follow_enabled_set() {
        let gate = ModuleGate::with_override(ModuleConfig::defaults(), [ModuleId::Vendors]);
        assert!(gate.is_route_enabled("/vendors"));
        assert!(gate.is_route_enabled("/assessments/12/questions"));
        assert!(!gate.is_route_enabled("/risks/1"));
        assert!(!gate.is_route_enabled("/vendorsx"));
    }

    #[test]
    fn settings_nav_section_is_always_visible() {
        let gate = ModuleGate::with_override(ModuleConfig::defaults(), [ModuleId::Risk]);
        assert!(gate.is_nav_section_enabled("Settings"));
        assert!(gate.is_nav_section_enabled("Risk Management"));
        assert!(!gate.is_nav_section_enabled("Vendor Management"));
        assert!(!gate.is_nav_section_enabled("Unknown"));
    }

    #[test]
    fn active_preset_requires_exact_set() {
        let standard = ModuleGate::with_override(
            ModuleConfig::defaults(),
            [ModuleId::Audit, ModuleId::Compliance, ModuleId::Vendors, ModuleId::Risk],
        );
        assert_eq!(standard.active_preset().map(|p| p.id), Some("standard"));

        let full = ModuleGate::with_override(ModuleConfig::defaults(), ModuleId::ALL);
        assert_eq!(full.active_preset().map(|p| p.id), Some("full"));

        let custom = ModuleGate::with_override(ModuleConfig::defaults(), [ModuleId::Risk]);
        assert!(custom.active_preset().is_none());
        assert_eq!(custom.disabled_modules().len(), ModuleId::ALL.len() - 1);
    }

    proptest! {
        #[test]
        fn settings_ai_tracks_ai_module(suffix in "(/[a-z]{1,8}){0,3}", ai in any::<bool>()) {
            let modules: Vec<ModuleId> = if ai { vec![ModuleId::Ai] } else { vec![] };
            let gate = ModuleGate::with_override(ModuleConfig::defaults(), modules);
            let path = format!("/settings/ai{suffix}");
            prop_assert_eq!(gate.is_route_enabled(&path), ai);
        }
    }
}
