//! `efsml synth` — render the stack template.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::synth::{self, TemplateFormat};
use crate::commands::StackArgs;
use crate::output::TerminalReporter;

/// Template serialisation format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Yaml,
}

impl From<FormatArg> for TemplateFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => TemplateFormat::Json,
            FormatArg::Yaml => TemplateFormat::Yaml,
        }
    }
}

/// Arguments for the synth command.
#[derive(Args)]
pub struct SynthArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Function code directory, fingerprinted into the template metadata
    #[arg(long, default_value = "lambda")]
    pub code_dir: PathBuf,

    /// Output directory [default: synth.out_dir from config]
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Template format
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Print the template to stdout instead of writing a file
    #[arg(long, conflicts_with = "out_dir")]
    pub stdout: bool,
}

/// Run the synth command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the stack cannot be
/// declared, or the template cannot be written.
pub fn run(app: &AppContext, args: &SynthArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let props = config.resolve(&args.stack.overrides())?;

    let out_dir = if args.stdout {
        None
    } else {
        Some(
            args.out_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.synth.out_dir)),
        )
    };

    let reporter = TerminalReporter::new(&app.output);
    let outcome = synth::synth(
        &props,
        &args.code_dir,
        args.format.into(),
        out_dir.as_deref(),
        &app.fs,
        &reporter,
    )?;

    if args.stdout {
        print!("{}", outcome.rendered);
    } else {
        app.renderer().render_synth(&outcome)?;
    }
    Ok(ExitCode::SUCCESS)
}
