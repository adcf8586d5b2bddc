//! Generate command - render the form and resolve its controls.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formgen_core::{GenerationOutcome, GenerationRequest};

use super::{DEFAULT_OUTPUT, DEFAULT_SPEC};

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to the JSON form specification
    #[arg(long, default_value = DEFAULT_SPEC)]
    pub spec: PathBuf,

    /// Output .docx path
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub out: PathBuf,

    /// Logo path overriding branding.logo_path
    #[arg(long)]
    pub logo: Option<String>,

    /// Only validate the specification and locate the logo
    #[arg(long)]
    pub validate_only: bool,

    /// Write static placeholders instead of interactive controls
    #[arg(long)]
    pub no_controls: bool,

    /// Configuration file (defaults to ./formgen.toml when present)
    #[arg(long, env = "FORMGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn execute(args: GenerateArgs) -> Result<()> {
    let (cwd, generator) = super::generator(args.config.as_deref())?;

    let spec = cwd.join(&args.spec);
    let mut request = GenerationRequest::new(&spec, cwd.join(&args.out));
    if let Some(logo) = args.logo {
        request = request.logo(logo);
    }
    if args.validate_only {
        request = request.validate_only();
    }
    if args.no_controls {
        request = request.no_controls();
    }

    let outcome = generator
        .run(&request)
        .with_context(|| format!("Failed to generate form from {}", spec.display()))?;
    report(&spec, &outcome);
    Ok(())
}

pub(crate) fn report(spec: &std::path::Path, outcome: &GenerationOutcome) {
    match outcome {
        GenerationOutcome::Validated { logo, warnings } => {
            for warning in warnings {
                println!("⚠️  {}", warning);
            }
            println!("✅ Validation passed for spec: {}", spec.display());
            println!("   Logo: {}", logo.display());
        }
        GenerationOutcome::Interactive { output, report } => {
            println!(
                "✅ Document with {} interactive fields saved to: {}",
                report.controls_inserted,
                output.display()
            );
        }
        GenerationOutcome::Fallback {
            output,
            report,
            reason,
        } => {
            println!(
                "⚠️  Warning: {}; {} markers written as static text.",
                reason, report.replacements
            );
            println!("✅ Document saved to: {}", output.display());
        }
    }
}
