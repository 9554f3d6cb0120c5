//! Application service — template synthesis use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use efsml_common::Template;

use crate::application::ports::{CodeFingerprinter, ProgressReporter, TemplateStore};
use crate::domain::config::StackProps;
use crate::domain::stack::{SynthOptions, SynthesizedStack, synthesize};

/// Serialisation format of a rendered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

impl TemplateFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            TemplateFormat::Json => "json",
            TemplateFormat::Yaml => "yaml",
        }
    }

    /// Guess the format from a file name; anything but `.yaml`/`.yml` is JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => TemplateFormat::Yaml,
            _ => TemplateFormat::Json,
        }
    }

    /// Serialise `template`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn render(self, template: &Template) -> Result<String> {
        match self {
            TemplateFormat::Json => {
                let mut text =
                    serde_json::to_string_pretty(template).context("cannot serialize template")?;
                text.push('\n');
                Ok(text)
            }
            TemplateFormat::Yaml => {
                serde_yaml::to_string(template).context("cannot serialize template")
            }
        }
    }

    /// Parse a template previously rendered in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid template.
    pub fn parse(self, text: &str) -> Result<Template> {
        match self {
            TemplateFormat::Json => serde_json::from_str(text).context("cannot parse JSON template"),
            TemplateFormat::Yaml => serde_yaml::from_str(text).context("cannot parse YAML template"),
        }
    }
}

/// Result of a synth run.
#[derive(Debug)]
pub struct SynthOutcome {
    pub stack: SynthesizedStack,
    pub format: TemplateFormat,
    /// The serialised template.
    pub rendered: String,
    /// Where the template was written, if it was.
    pub path: Option<PathBuf>,
}

impl SynthOutcome {
    /// `{stack}.template.{ext}`
    #[must_use]
    pub fn file_name(&self) -> String {
        template_file_name(&self.stack.stack_name, self.format)
    }
}

/// `{stack}.template.{ext}`
#[must_use]
pub fn template_file_name(stack_name: &str, format: TemplateFormat) -> String {
    format!("{stack_name}.template.{}", format.extension())
}

/// Fingerprint the code directory and declare the stack.
///
/// A missing code directory is reported as a warning; the template is
/// still rendered, without the fingerprint metadata.
///
/// # Errors
///
/// Returns an error if fingerprinting fails or the stack cannot be declared.
pub fn build_stack(
    props: &StackProps,
    code_dir: &Path,
    fingerprinter: &impl CodeFingerprinter,
    reporter: &impl ProgressReporter,
) -> Result<SynthesizedStack> {
    reporter.step(&format!("fingerprinting {}", code_dir.display()));
    let code_fingerprint = fingerprinter
        .fingerprint(code_dir)
        .with_context(|| format!("cannot fingerprint {}", code_dir.display()))?;
    if code_fingerprint.is_none() {
        tracing::warn!(dir = %code_dir.display(), "code directory not found");
        reporter.warn(&format!(
            "code directory {} not found; template has no asset hash",
            code_dir.display()
        ));
    }

    reporter.step(&format!("declaring {}", props.stack_name()));
    let stack = synthesize(props, &SynthOptions { code_fingerprint })?;
    Ok(stack)
}

/// Declare the stack and render it, writing to `out_dir` unless it is `None`.
///
/// # Errors
///
/// Returns an error if declaration, serialisation or the write fails.
pub fn synth(
    props: &StackProps,
    code_dir: &Path,
    format: TemplateFormat,
    out_dir: Option<&Path>,
    ports: &(impl CodeFingerprinter + TemplateStore),
    reporter: &impl ProgressReporter,
) -> Result<SynthOutcome> {
    let stack = build_stack(props, code_dir, ports, reporter)?;
    let rendered = format.render(&stack.template)?;

    let path = match out_dir {
        Some(dir) => {
            let file_name = template_file_name(&stack.stack_name, format);
            let path = ports
                .write(dir, &file_name, &rendered)
                .with_context(|| format!("cannot write template to {}", dir.display()))?;
            tracing::info!(path = %path.display(), bytes = rendered.len(), "template written");
            reporter.success(&format!("wrote {}", path.display()));
            Some(path)
        }
        None => None,
    };

    Ok(SynthOutcome {
        stack,
        format,
        rendered,
        path,
    })
}
