//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use efsml_common::TemplateError;

// ── Stack errors ──────────────────────────────────────────────────────────────

/// Errors raised while declaring the stack.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Invalid {field} '{value}': must match ^[A-Za-z][A-Za-z0-9]*(-[A-Za-z0-9]+)*$")]
    InvalidName { field: &'static str, value: String },

    #[error("Stack name base '{base}' is {len} characters; the limit is {max}")]
    NameTooLong { base: String, len: usize, max: usize },

    #[error("Custom resource '{0}' declares neither a create nor an update call")]
    EmptyCustomResource(String),

    #[error("Failed to render build spec: {0}")]
    BuildSpec(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

// ── Graph errors ──────────────────────────────────────────────────────────────

/// Errors raised while ordering the resource graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Resource '{from}' references unknown logical id '{to}'")]
    DanglingReference { from: String, to: String },

    #[error("Dependency cycle between: {}", .remaining.join(", "))]
    Cycle { remaining: Vec<String> },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
