//! Human-readable terminal renderer.

use std::collections::BTreeMap;
use std::path::Path;

use efsml_common::Template;
use owo_colors::OwoColorize as _;

use crate::application::services::plan::Plan;
use crate::application::services::synth::SynthOutcome;
use crate::application::services::validate::ValidationReport;
use crate::domain::config::EfsmlConfig;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("efsml {version}");
    }

    /// Render the summary of a synth run.
    pub fn render_synth(&self, outcome: &SynthOutcome) {
        if self.ctx.quiet {
            return;
        }
        let template = &outcome.stack.template;
        println!();
        self.ctx.header(&format!("Stack {}", outcome.stack.stack_name));
        println!();
        self.ctx
            .kv("Resources: ", &pluralize(template.resources.len(), "resource"));
        for (resource_type, count) in type_counts(template) {
            println!("    {count:>3}  {}", resource_type.style(self.ctx.styles.dim));
        }
        self.ctx.kv(
            "Parameters:",
            &template.parameters.keys().cloned().collect::<Vec<_>>().join(", "),
        );
        self.ctx.kv(
            "Outputs:   ",
            &template.outputs.keys().cloned().collect::<Vec<_>>().join(", "),
        );
        println!();
        match &outcome.path {
            Some(path) => self.ctx.success(&format!("Template written to {}", path.display())),
            None => self.ctx.info("Template not written"),
        }
    }

    /// Render the deployment order, one wave per block.
    pub fn render_plan(&self, plan: &Plan) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header(&format!(
            "Deployment order for {} ({}, {})",
            plan.stack_name,
            pluralize(plan.resource_count, "resource"),
            pluralize(plan.waves.len(), "wave"),
        ));
        for (i, wave) in plan.waves.iter().enumerate() {
            println!();
            println!("  {}", format!("Wave {}", i + 1).style(self.ctx.styles.bold));
            for resource in wave {
                println!(
                    "    {:<56} {}",
                    resource.logical_id.style(self.ctx.styles.id),
                    resource.resource_type.style(self.ctx.styles.dim),
                );
            }
        }
        println!();
    }

    /// Render check results followed by a one-line summary.
    pub fn render_validation(&self, report: &ValidationReport) {
        if !self.ctx.quiet {
            println!();
            self.ctx.header(&format!("Checks for {}", report.source));
            println!();
            for check in &report.checks {
                self.print_check(check.passed, check.name, &check.detail);
            }
            println!();
        }
        if report.passed {
            self.ctx.success(&format!(
                "All {} passed",
                pluralize(report.checks.len(), "check")
            ));
        } else {
            // Failures reach the user even with --quiet.
            self.ctx.error(&format!(
                "{} of {} failed",
                report.failures(),
                pluralize(report.checks.len(), "check")
            ));
        }
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &EfsmlConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<26} {}", "stack.prefix:", config.stack.prefix);
        println!("  {:<26} {}", "stack.stage:", config.stack.stage);
        println!(
            "  {:<26} {}",
            "stack.install_packages:",
            config
                .stack
                .install_packages
                .as_deref()
                .unwrap_or("(default: tensorflow)")
        );
        println!("  {:<26} {}", "synth.out_dir:", config.synth.out_dir);
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in [
            "EFSML_CONFIG",
            "EFSML_PREFIX",
            "EFSML_STAGE",
            "EFSML_INSTALL_PACKAGES",
            "NO_COLOR",
        ] {
            println!(
                "    {:<24} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    /// Confirm a `config set`.
    pub fn render_config_set(&self, key: &str, value: &str) {
        self.ctx.success(&format!("Set {key} = {value}"));
    }

    fn print_check(&self, ok: bool, name: &str, detail: &str) {
        let mark = if ok {
            "\u{2713}".style(self.ctx.styles.success).to_string()
        } else {
            "\u{2717}".style(self.ctx.styles.error).to_string()
        };
        println!("    {mark} {name:<28} {}", detail.style(self.ctx.styles.dim));
    }
}

// ── Display helpers (used by tests and output layer) ─────────────────────────

/// `1 resource`, `42 resources`.
#[must_use]
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Resource count per type, sorted by type name.
#[must_use]
pub fn type_counts(template: &Template) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for resource in template.resources.values() {
        *counts.entry(resource.resource_type.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(t, n)| (t.to_string(), n))
        .collect()
}
