//! Form generation pipeline.
//!
//! load → validate → plan → find logo → render into a temporary working
//! directory → resolve markers (interactive or fallback) → write output.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use formgen_controls::{
    AutomationChannel, AutomationConnector, BridgeAutomation, ControlResolver, ControlsError,
    ControlsResult, DocumentFormat, FallbackFormatter, FallbackReport, NativeAutomation,
    ResolveReport,
};
use formgen_render::{DocumentRenderer, DocxWriter, FormDocument};
use formgen_spec::{FormSpecification, Placeholder, PlaceholderPlanner, SpecReader, SpecValidator};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::config::{AutomationConfig, Engine, GeneratorConfig};
use crate::error::CoreResult;
use crate::logo::resolve_logo_path;

const WORK_DIR_PREFIX: &str = "formgen_form_";
const BASE_NAME: &str = "base_form";

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub spec_path: PathBuf,
    pub output_path: PathBuf,
    /// Replaces `branding.logo_path`.
    pub logo_override: Option<String>,
    /// Stop after validation and logo lookup.
    pub validate_only: bool,
    /// Skip automation and write static glyphs.
    pub no_controls: bool,
}

impl GenerationRequest {
    pub fn new(spec_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            spec_path: spec_path.into(),
            output_path: output_path.into(),
            logo_override: None,
            validate_only: false,
            no_controls: false,
        }
    }

    pub fn logo(mut self, logo: impl Into<String>) -> Self {
        self.logo_override = Some(logo.into());
        self
    }

    pub fn validate_only(mut self) -> Self {
        self.validate_only = true;
        self
    }

    pub fn no_controls(mut self) -> Self {
        self.no_controls = true;
        self
    }
}

/// Why the plain-text fallback was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Controls were switched off for this run.
    Requested,
    /// The automation host could not be reached.
    AutomationUnavailable(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "interactive controls disabled"),
            Self::AutomationUnavailable(reason) => write!(f, "automation unavailable: {}", reason),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Validated {
        logo: PathBuf,
        warnings: Vec<String>,
    },
    Interactive {
        output: PathBuf,
        report: ResolveReport,
    },
    Fallback {
        output: PathBuf,
        report: FallbackReport,
        reason: FallbackReason,
    },
}

/// Connector for the configured engine.
pub fn connector_for(config: &AutomationConfig) -> Box<dyn AutomationConnector> {
    match config.engine {
        Engine::Native => Box::new(|| -> ControlsResult<Box<dyn AutomationChannel>> {
            Ok(Box::new(NativeAutomation::new()))
        }),
        Engine::Bridge => {
            let command = config.bridge_command.clone().unwrap_or_default();
            let args = config.bridge_args.clone();
            Box::new(move || -> ControlsResult<Box<dyn AutomationChannel>> {
                Ok(Box::new(BridgeAutomation::spawn(&command, &args)?))
            })
        }
    }
}

/// Runs [`GenerationRequest`]s.
pub struct Generator {
    config: GeneratorConfig,
    connector: Box<dyn AutomationConnector>,
    working_dir: PathBuf,
}

impl Generator {
    /// Generator using the engine named in `config`, looking up relative
    /// logos from `working_dir`.
    pub fn new(config: GeneratorConfig, working_dir: impl Into<PathBuf>) -> Self {
        let connector = connector_for(&config.automation);
        Self::with_connector(config, working_dir, connector)
    }

    pub fn with_connector(
        config: GeneratorConfig,
        working_dir: impl Into<PathBuf>,
        connector: Box<dyn AutomationConnector>,
    ) -> Self {
        Self {
            config,
            connector,
            working_dir: working_dir.into(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn run(&self, request: &GenerationRequest) -> CoreResult<GenerationOutcome> {
        info!("Loading specification {:?}", request.spec_path);
        let value = SpecReader::load(&request.spec_path)?;
        let report = SpecValidator::validate(&value)?;
        for warning in &report.warnings {
            warn!("{}", warning);
        }
        let spec = FormSpecification::from_value(value)?;

        let logo = resolve_logo_path(
            &request.spec_path,
            &spec.branding.logo_path,
            request.logo_override.as_deref(),
            &self.working_dir,
        )?;
        info!("Using logo {:?}", logo);

        if request.validate_only {
            return Ok(GenerationOutcome::Validated {
                logo,
                warnings: report.warnings,
            });
        }

        let placeholders = PlaceholderPlanner::plan(&spec);
        let work_dir = tempfile::Builder::new().prefix(WORK_DIR_PREFIX).tempdir()?;
        let document = DocumentRenderer::new(self.config.text.render_text())
            .render(&spec, &logo, &placeholders)?;

        if request.no_controls {
            return self.fallback(
                document,
                &placeholders,
                &work_dir,
                request,
                FallbackReason::Requested,
            );
        }

        let mut channel = match self.connector.connect() {
            Ok(channel) => channel,
            Err(ControlsError::Unavailable(reason))
                if self.config.automation.fallback_on_unavailable =>
            {
                warn!("Automation unavailable ({}), falling back to plain text", reason);
                return self.fallback(
                    document,
                    &placeholders,
                    &work_dir,
                    request,
                    FallbackReason::AutomationUnavailable(reason),
                );
            }
            Err(err) => return Err(err.into()),
        };

        let format = channel.document_format();
        let base = work_dir
            .path()
            .join(format!("{}.{}", BASE_NAME, format.extension()));
        write_base(&document, format, &base)?;

        let report = ControlResolver::new(self.config.text.control_text()).resolve(
            channel.as_mut(),
            &base,
            &request.output_path,
            &placeholders,
        )?;

        Ok(GenerationOutcome::Interactive {
            output: request.output_path.clone(),
            report,
        })
    }

    fn fallback(
        &self,
        mut document: FormDocument,
        placeholders: &[Placeholder],
        work_dir: &TempDir,
        request: &GenerationRequest,
        reason: FallbackReason,
    ) -> CoreResult<GenerationOutcome> {
        let report = FallbackFormatter::new(self.config.text.fallback_glyphs())
            .apply(&mut document, placeholders);

        let base = work_dir.path().join(format!("{}.docx", BASE_NAME));
        DocxWriter::write(&document, &base)?;
        if let Some(parent) = request.output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&base, &request.output_path)?;

        Ok(GenerationOutcome::Fallback {
            output: request.output_path.clone(),
            report,
            reason,
        })
    }
}

fn write_base(document: &FormDocument, format: DocumentFormat, path: &Path) -> CoreResult<()> {
    match format {
        DocumentFormat::Snapshot => document.save_snapshot(path)?,
        DocumentFormat::Docx => DocxWriter::write(document, path)?,
    }
    Ok(())
}
