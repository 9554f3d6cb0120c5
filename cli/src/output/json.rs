//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed JSON document
//! to stdout. Failures use the error object from [`format_error`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::application::services::plan::Plan;
use crate::application::services::synth::SynthOutcome;
use crate::application::services::validate::ValidationReport;
use crate::domain::config::EfsmlConfig;
use crate::domain::error::{ConfigError, GraphError, StackError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable error code for the JSON error object, taken from the first domain
/// error in the chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if cause.is::<ConfigError>() {
            return "CONFIG_INVALID";
        }
        if cause.is::<StackError>() {
            return "STACK_INVALID";
        }
        if cause.is::<GraphError>() {
            return "GRAPH_INVALID";
        }
    }
    "ERROR"
}

/// Summary document for a synth run; the template itself is not embedded.
#[must_use]
pub fn synth_summary(outcome: &SynthOutcome) -> serde_json::Value {
    let template = &outcome.stack.template;
    json!({
        "stack": outcome.stack.stack_name,
        "format": outcome.format.extension(),
        "path": outcome.path.as_ref().map(|p| p.display().to_string()),
        "resource_count": template.resources.len(),
        "parameters": template.parameters.keys().collect::<Vec<_>>(),
        "outputs": template.outputs.keys().collect::<Vec<_>>(),
        "function": outcome.stack.resources.function.id,
        "build_project": outcome.stack.resources.build_project.id,
        "trigger": outcome.stack.resources.trigger,
    })
}

/// Renders domain types as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print the synth summary.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_synth(&self, outcome: &SynthOutcome) -> Result<()> {
        print_json(&synth_summary(outcome))
    }

    /// Print the deployment plan.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_plan(&self, plan: &Plan) -> Result<()> {
        print_json(plan)
    }

    /// Print the validation report.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_validation(&self, report: &ValidationReport) -> Result<()> {
        print_json(report)
    }

    /// Print the configuration and its location.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &EfsmlConfig, path: &Path) -> Result<()> {
        print_json(&json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// Print the applied setting.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config_set(&self, key: &str, value: &str) -> Result<()> {
        print_json(&json!({ "key": key, "value": value }))
    }

    /// Print the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print_json(&json!({ "version": version }))
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{text}");
    Ok(())
}
