//! Domain types and validators for efsml configuration.
//!
//! Pure functions only — no I/O, no filesystem access.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, StackError};

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "stack.prefix",
    "stack.stage",
    "stack.install_packages",
    "synth.out_dir",
];

/// Longest accepted `{prefix}-{stage}`. Leaves room for the `-Lambda`
/// suffix under the 64 character function name limit and for the longest
/// derived logical id.
pub const MAX_NAME_BASE_LEN: usize = 40;

/// Prefix and stage are used verbatim in resource names.
pub static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z][A-Za-z0-9]*(-[A-Za-z0-9]+)*$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.efsml/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EfsmlConfig {
    /// Stack inputs.
    pub stack: StackSettings,
    /// Synthesis output settings.
    pub synth: SynthSettings,
}

/// Stack inputs as persisted; validated into [`StackProps`] before use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StackSettings {
    pub prefix: String,
    pub stage: String,
    /// Packages for `pip3 install`; `tensorflow` when unset.
    pub install_packages: Option<String>,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            prefix: "efsml".to_string(),
            stage: "dev".to_string(),
            install_packages: None,
        }
    }
}

/// Where `efsml synth` writes templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SynthSettings {
    pub out_dir: String,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            out_dir: "synth.out".to_string(),
        }
    }
}

/// Per-invocation overrides from CLI flags or environment variables.
#[derive(Debug, Clone, Default)]
pub struct StackOverrides {
    pub prefix: Option<String>,
    pub stage: Option<String>,
    pub install_packages: Option<String>,
}

impl EfsmlConfig {
    /// Merge `overrides` over the stored settings and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective prefix, stage or package list is
    /// invalid.
    pub fn resolve(&self, overrides: &StackOverrides) -> Result<StackProps, StackError> {
        let prefix = overrides.prefix.as_deref().unwrap_or(&self.stack.prefix);
        let stage = overrides.stage.as_deref().unwrap_or(&self.stack.stage);
        let packages = overrides
            .install_packages
            .as_deref()
            .or(self.stack.install_packages.as_deref());
        StackProps::new(prefix, stage, packages)
    }
}

// ── Validated stack inputs ───────────────────────────────────────────────────

/// The three inputs of the stack, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackProps {
    prefix: String,
    stage: String,
    install_packages: Option<String>,
}

impl StackProps {
    /// Validate and build stack inputs. A blank package list counts as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if prefix or stage is not a valid name fragment or if
    /// `{prefix}-{stage}` is too long.
    pub fn new(
        prefix: &str,
        stage: &str,
        install_packages: Option<&str>,
    ) -> Result<Self, StackError> {
        validate_name("prefix", prefix)?;
        validate_name("stage", stage)?;

        let base = format!("{prefix}-{stage}");
        if base.len() > MAX_NAME_BASE_LEN {
            return Err(StackError::NameTooLong {
                len: base.len(),
                base,
                max: MAX_NAME_BASE_LEN,
            });
        }

        let install_packages = install_packages
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(Self {
            prefix: prefix.to_string(),
            stage: stage.to_string(),
            install_packages,
        })
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    #[must_use]
    pub fn install_packages(&self) -> Option<&str> {
        self.install_packages.as_deref()
    }

    /// `{prefix}-{stage}`, the base of every resource name.
    #[must_use]
    pub fn name_base(&self) -> String {
        format!("{}-{}", self.prefix, self.stage)
    }

    /// The CloudFormation stack name.
    #[must_use]
    pub fn stack_name(&self) -> String {
        format!("{}-stack", self.name_base())
    }
}

fn validate_name(field: &'static str, value: &str) -> Result<(), StackError> {
    if !NAME_RE.is_match(value) {
        return Err(StackError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };
    match key {
        "stack.prefix" | "stack.stage" => {
            if !NAME_RE.is_match(value) {
                return Err(invalid(
                    "Must start with a letter and contain only letters, digits and single dashes"
                        .to_string(),
                )
                .into());
            }
        }
        "stack.install_packages" => {}
        "synth.out_dir" => {
            if value.trim().is_empty() {
                return Err(invalid("Output directory must not be empty".to_string()).into());
            }
        }
        _ => validate_config_key(key)?,
    }
    Ok(())
}

/// Apply a validated key/value to `config`. An empty package list clears it.
///
/// # Errors
///
/// Returns an error if the key or value is invalid.
pub fn apply_config_value(config: &mut EfsmlConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    match key {
        "stack.prefix" => config.stack.prefix = value.to_string(),
        "stack.stage" => config.stack.stage = value.to_string(),
        "stack.install_packages" => {
            let trimmed = value.trim();
            config.stack.install_packages = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        "synth.out_dir" => config.synth.out_dir = value.to_string(),
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
