//! Static module catalog and presets.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use grc_core::DomainError;

/// Product module identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleId {
    Compliance,
    Risk,
    Vendors,
    Audit,
    Bcdr,
    Trust,
    Ai,
    Mcp,
    ConfigAsCode,
}

impl ModuleId {
    pub const ALL: [ModuleId; 9] = [
        ModuleId::Compliance,
        ModuleId::Risk,
        ModuleId::Vendors,
        ModuleId::Audit,
        ModuleId::Bcdr,
        ModuleId::Trust,
        ModuleId::Ai,
        ModuleId::Mcp,
        ModuleId::ConfigAsCode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleId::Compliance => "compliance",
            ModuleId::Risk => "risk",
            ModuleId::Vendors => "vendors",
            ModuleId::Audit => "audit",
            ModuleId::Bcdr => "bcdr",
            ModuleId::Trust => "trust",
            ModuleId::Ai => "ai",
            ModuleId::Mcp => "mcp",
            ModuleId::ConfigAsCode => "config-as-code",
        }
    }

    pub fn definition(self) -> &'static ModuleDefinition {
        // The catalog lists every variant in declaration order.
        &MODULE_CATALOG[self as usize]
    }
}

impl core::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown module '{s}'")))
    }
}

/// Catalog entry. Immutable at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub id: ModuleId,
    pub name: &'static str,
    /// Path prefixes owned by the module, in match order.
    pub routes: &'static [&'static str],
    pub nav_sections: &'static [&'static str],
    pub default_enabled: bool,
    pub env_var: &'static str,
}

impl ModuleDefinition {
    /// `path` equals a route or lies beneath one.
    pub fn owns_route(&self, path: &str) -> bool {
        self.routes.iter().any(|route| route_matches(path, route))
    }
}

pub(crate) fn route_matches(path: &str, route: &str) -> bool {
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub static MODULE_CATALOG: [ModuleDefinition; 9] = [
    ModuleDefinition {
        id: ModuleId::Compliance,
        name: "Compliance",
        routes: &["/frameworks", "/controls", "/evidence", "/policies", "/integrations"],
        nav_sections: &["Compliance"],
        default_enabled: true,
        env_var: "VITE_ENABLE_COMPLIANCE_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::Risk,
        name: "Risk Management",
        routes: &["/risks", "/risk-assessments", "/risk-treatments"],
        nav_sections: &["Risk Management"],
        default_enabled: true,
        env_var: "VITE_ENABLE_RISK_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::Vendors,
        name: "Vendor Management",
        routes: &["/vendors", "/assessments", "/contracts"],
        nav_sections: &["Vendor Management"],
        default_enabled: true,
        env_var: "VITE_ENABLE_VENDORS_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::Audit,
        name: "Audit",
        routes: &["/audits", "/audit-findings", "/auditor-portal"],
        nav_sections: &["Audit"],
        default_enabled: true,
        env_var: "VITE_ENABLE_AUDIT_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::Bcdr,
        name: "Business Continuity",
        routes: &["/bcdr", "/business-impact", "/recovery-plans"],
        nav_sections: &["Business Continuity"],
        default_enabled: false,
        env_var: "VITE_ENABLE_BCDR_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::Trust,
        name: "Trust Center",
        routes: &["/trust-center", "/questionnaires", "/knowledge-base", "/answer-templates"],
        nav_sections: &["Trust"],
        default_enabled: false,
        env_var: "VITE_ENABLE_TRUST_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::Ai,
        name: "AI Assist",
        routes: &["/settings/ai", "/ai"],
        nav_sections: &["AI"],
        default_enabled: false,
        env_var: "VITE_ENABLE_AI_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::Mcp,
        name: "MCP",
        routes: &["/settings/mcp"],
        nav_sections: &[],
        default_enabled: false,
        env_var: "VITE_ENABLE_MCP_MODULE",
    },
    ModuleDefinition {
        id: ModuleId::ConfigAsCode,
        name: "Config as Code",
        routes: &["/settings/config-as-code"],
        nav_sections: &[],
        default_enabled: false,
        env_var: "VITE_ENABLE_CONFIG_AS_CODE_MODULE",
    },
];

/// Named module combination offered in organization settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub modules: &'static [ModuleId],
}

pub static MODULE_PRESETS: [ModulePreset; 4] = [
    ModulePreset {
        id: "compliance-only",
        name: "Compliance Only",
        modules: &[ModuleId::Compliance, ModuleId::Audit],
    },
    ModulePreset {
        id: "risk-focused",
        name: "Risk Focused",
        modules: &[ModuleId::Compliance, ModuleId::Risk, ModuleId::Vendors],
    },
    ModulePreset {
        id: "standard",
        name: "Standard GRC",
        modules: &[ModuleId::Compliance, ModuleId::Risk, ModuleId::Vendors, ModuleId::Audit],
    },
    ModulePreset {
        id: "full",
        name: "Full Platform",
        modules: &ModuleId::ALL,
    },
];
