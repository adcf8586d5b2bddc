//! Validate command - check a specification and its logo.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formgen_core::GenerationRequest;

use super::DEFAULT_SPEC;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the JSON form specification
    #[arg(long, default_value = DEFAULT_SPEC)]
    pub spec: PathBuf,

    /// Logo path overriding branding.logo_path
    #[arg(long)]
    pub logo: Option<String>,

    /// Configuration file (defaults to ./formgen.toml when present)
    #[arg(long, env = "FORMGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let (cwd, generator) = super::generator(args.config.as_deref())?;

    let spec = cwd.join(&args.spec);
    // the output path is never written when only validating
    let mut request = GenerationRequest::new(&spec, cwd.join(super::DEFAULT_OUTPUT)).validate_only();
    if let Some(logo) = args.logo {
        request = request.logo(logo);
    }

    let outcome = generator
        .run(&request)
        .with_context(|| format!("Validation failed for {}", spec.display()))?;
    super::generate::report(&spec, &outcome);
    Ok(())
}
