//! Process-wide logging setup shared by every host of the policy layer.

pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat, init, init_with};
