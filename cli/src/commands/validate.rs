//! `efsml validate` — run the structural checks.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::validate::{load_template, validate, validate_stack};
use crate::commands::StackArgs;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Check a rendered template file (stack flags are then ignored)
    #[arg(long)]
    pub template: Option<PathBuf>,
}

/// Run the validate command. Exits 1 when any check fails.
///
/// # Errors
///
/// Returns an error if the template cannot be loaded or the stack declared.
pub fn run(app: &AppContext, args: &ValidateArgs) -> Result<ExitCode> {
    let report = match &args.template {
        Some(path) => {
            let template = load_template(&app.fs, path)?;
            validate(&path.display().to_string(), &template)
        }
        None => {
            let props = config_service::resolve_props(&app.config_store, &args.stack.overrides())?;
            validate_stack(&props)?
        }
    };
    app.renderer().render_validation(&report)?;
    Ok(if report.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
