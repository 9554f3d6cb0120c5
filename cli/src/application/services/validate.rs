//! Application service — template checks.

use std::path::Path;

use anyhow::{Context, Result};
use efsml_common::Template;
use serde::Serialize;

use crate::application::ports::TemplateStore;
use crate::application::services::synth::TemplateFormat;
use crate::domain::checks::{CheckResult, all_passed, run_checks};
use crate::domain::config::StackProps;
use crate::domain::stack::{SynthOptions, synthesize};

/// Check results for one template.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Stack name, or the template path when read from disk.
    pub source: String,
    pub passed: bool,
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    #[must_use]
    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}

/// Run every check against `template`.
#[must_use]
pub fn validate(source: &str, template: &Template) -> ValidationReport {
    let checks = run_checks(template);
    let passed = all_passed(&checks);
    for check in checks.iter().filter(|c| !c.passed) {
        tracing::warn!(check = check.name, detail = %check.detail, "check failed");
    }
    ValidationReport {
        source: source.to_string(),
        passed,
        checks,
    }
}

/// Load a rendered template from disk; the format follows the extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_template(store: &impl TemplateStore, path: &Path) -> Result<Template> {
    let text = store.read(path)?;
    TemplateFormat::from_path(path)
        .parse(&text)
        .with_context(|| format!("invalid template {}", path.display()))
}

/// Declare the stack for `props` and check it.
///
/// # Errors
///
/// Returns an error if the stack cannot be declared.
pub fn validate_stack(props: &StackProps) -> Result<ValidationReport> {
    let stack = synthesize(props, &SynthOptions::default())?;
    Ok(validate(&stack.stack_name, &stack.template))
}
