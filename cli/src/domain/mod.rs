//! Domain layer — pure stack declaration, graph analysis and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod buildspec;
pub mod checks;
pub mod config;
pub mod error;
pub mod graph;
pub mod naming;
pub mod stack;

pub use checks::{CheckResult, all_passed, run_checks};
pub use config::{EfsmlConfig, StackOverrides, StackProps, validate_config_key, validate_config_value};
pub use error::{ConfigError, GraphError, StackError};
pub use graph::ResourceGraph;
pub use stack::{SynthOptions, SynthesizedStack, synthesize};
