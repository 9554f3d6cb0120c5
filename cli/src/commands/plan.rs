//! `efsml plan` — show the order in which resources are created.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::plan::{plan, plan_stack};
use crate::application::services::validate::load_template;
use crate::application::services::config_service;
use crate::commands::StackArgs;

/// Arguments for the plan command.
#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Plan a rendered template file (stack flags are then ignored)
    #[arg(long)]
    pub template: Option<PathBuf>,
}

/// Run the plan command.
///
/// # Errors
///
/// Returns an error if the template cannot be loaded or declared, or if its
/// resources cannot be ordered.
pub fn run(app: &AppContext, args: &PlanArgs) -> Result<ExitCode> {
    let plan = match &args.template {
        Some(path) => {
            let template = load_template(&app.fs, path)?;
            plan(&template_label(path), &template)?
        }
        None => {
            let props = config_service::resolve_props(&app.config_store, &args.stack.overrides())?;
            plan_stack(&props)?
        }
    };
    app.renderer().render_plan(&plan)?;
    Ok(ExitCode::SUCCESS)
}

/// `foo-dev-stack.template.json` → `foo-dev-stack`.
fn template_label(path: &std::path::Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once(".template.") {
        Some((stack, _)) => stack.to_string(),
        None => path.display().to_string(),
    }
}
