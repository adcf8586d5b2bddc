//! CLI command definitions.
//!
//! `generate` runs the full pipeline, `validate` stops after the
//! specification and logo checks.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use formgen_core::{Generator, GeneratorConfig};
use tracing::debug;

pub mod generate;
pub mod validate;

pub const DEFAULT_SPEC: &str = "forms/intake_anamnese_spec.json";
pub const DEFAULT_OUTPUT: &str = "output/intake_form.docx";

/// formgen - branded Word intake forms from a JSON specification
#[derive(Parser)]
#[command(name = "formgen")]
#[command(version, about = "formgen - branded Word intake forms from a JSON specification")]
#[command(long_about = r#"
formgen turns a JSON form specification into a branded .docx intake form
with fillable content controls.

COMMANDS:
  generate  → Validate, render and write the form
  validate  → Validate the specification and locate the logo

CONFIGURATION:
  formgen.toml in the working directory, or a file given with --config.

EXIT CODES:
  0 - Success
  1 - Failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the Word form
    Generate(generate::GenerateArgs),

    /// Validate a specification without writing a document
    Validate(validate::ValidateArgs),
}

/// Working directory plus a generator configured for it.
pub(crate) fn generator(config: Option<&Path>) -> Result<(PathBuf, Generator)> {
    let cwd = env::current_dir().context("Failed to read the working directory")?;
    debug!("Working directory: {:?}", cwd);
    let config = config.map(|path| cwd.join(path));
    let config = GeneratorConfig::load(&cwd, config.as_deref())
        .context("Failed to load configuration")?;
    Ok((cwd.clone(), Generator::new(config, cwd)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["formgen", "generate"]).unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.spec, PathBuf::from(DEFAULT_SPEC));
        assert_eq!(args.out, PathBuf::from(DEFAULT_OUTPUT));
        assert!(args.logo.is_none());
        assert!(!args.validate_only);
        assert!(!args.no_controls);
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "formgen",
            "generate",
            "--spec",
            "a.json",
            "--out",
            "b.docx",
            "--logo",
            "logo.png",
            "--no-controls",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.spec, PathBuf::from("a.json"));
        assert_eq!(args.logo.as_deref(), Some("logo.png"));
        assert!(args.no_controls);
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::try_parse_from(["formgen", "-q", "validate", "--spec", "x.json"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Validate(ref args) if args.spec == Path::new("x.json")));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["formgen", "-v", "-q", "generate"]).is_err());
    }
}
