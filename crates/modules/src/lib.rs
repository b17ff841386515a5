//! Feature-module gating: catalog, environment switches and organization config.
//!
//! A static catalog describes every product module (routes, navigation
//! sections, default state, environment switch). The [`ModuleGate`] holds the
//! one mutable piece, the enabled set, and answers visibility questions for
//! modules, routes and navigation sections.

pub mod catalog;
pub mod config;
pub mod gate;
pub mod org;

pub use catalog::{MODULE_CATALOG, MODULE_PRESETS, ModuleDefinition, ModuleId, ModulePreset};
pub use config::{ConfigError, EnvSource, MapEnv, ModuleConfig, ProcessEnv};
pub use gate::ModuleGate;
pub use org::{HttpOrgModuleFetcher, OrgModuleFetcher};
