//! Composition root of the policy layer.
//!
//! Wires permission resolution, module gating, workspace scoping and error
//! presentation into one [`PolicyLayer`] owned by the host application.

pub mod config;
pub mod layer;

pub use config::{API_URL_VAR, DEFAULT_API_URL, PolicyConfig};
pub use layer::{PolicyDeps, PolicyLayer, Session};
