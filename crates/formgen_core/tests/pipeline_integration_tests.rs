//! Integration tests for the generation pipeline.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use formgen_controls::{
    AutomationChannel, AutomationConnector, ControlRequest, ControlsError, ControlsResult,
    DocumentFormat, DocumentHandle, TextRange,
};
use formgen_core::{
    CoreError, FallbackReason, GenerationOutcome, GenerationRequest, Generator, GeneratorConfig,
};
use formgen_spec::SpecError;
use mockall::mock;
use serde_json::json;
use tempfile::{tempdir, TempDir};

mock! {
    pub Channel {}

    impl AutomationChannel for Channel {
        fn document_format(&self) -> DocumentFormat;
        fn open(&mut self, path: &Path) -> ControlsResult<DocumentHandle>;
        fn search(
            &mut self,
            handle: DocumentHandle,
            text: &str,
            from: usize,
        ) -> ControlsResult<Option<TextRange>>;
        fn replace_text(
            &mut self,
            handle: DocumentHandle,
            range: TextRange,
            text: &str,
        ) -> ControlsResult<()>;
        fn insert_control(
            &mut self,
            handle: DocumentHandle,
            range: TextRange,
            request: &ControlRequest,
        ) -> ControlsResult<()>;
        fn save_as(&mut self, handle: DocumentHandle, path: &Path) -> ControlsResult<()>;
        fn close(&mut self, handle: DocumentHandle) -> ControlsResult<()>;
        fn quit(&mut self) -> ControlsResult<()>;
    }
}

fn sample_logo() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../forms/assets/logo.png")
}

/// Writes the `name` / `symptoms(pain, fatigue)` form with its logo.
fn scenario_spec(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("forms/assets")).unwrap();
    fs::copy(sample_logo(), dir.join("forms/assets/logo.png")).unwrap();

    let spec = json!({
        "metadata": { "title": "Intake", "practice_name": "Practice" },
        "branding": {
            "primary_color": "#17372c",
            "secondary_color": "#2d5647",
            "accent_color": "#c99642",
            "surface_color": "#f4f1ea",
            "text_color": "#1f332c",
            "heading_font": "Georgia",
            "body_font": "Calibri",
            "logo_path": "assets/logo.png"
        },
        "document_layout": { "margin_cm": 2.0 },
        "sections": [{
            "id": "s1",
            "title": "About you",
            "description": 42,
            "fields": [
                { "id": "name", "label": "Name", "type": "text_short", "required": true, "help_text": "" },
                {
                    "id": "symptoms",
                    "label": "Symptoms",
                    "type": "checkbox_group",
                    "required": false,
                    "help_text": "",
                    "options": [
                        { "id": "pain", "label": "Pain" },
                        { "id": "fatigue", "label": "Fatigue" }
                    ]
                }
            ]
        }]
    });

    let path = dir.join("forms/spec.json");
    fs::write(&path, serde_json::to_vec_pretty(&spec).unwrap()).unwrap();
    path
}

fn generator(temp: &TempDir, config: GeneratorConfig) -> Generator {
    Generator::new(config, temp.path().join("cwd"))
}

/// Connector handing out `channel` once.
fn connector_once(channel: MockChannel) -> Box<dyn AutomationConnector> {
    let slot = Mutex::new(Some(channel));
    Box::new(move || -> ControlsResult<Box<dyn AutomationChannel>> {
        let channel = slot
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ControlsError::Unavailable("already connected".to_string()))?;
        Ok(Box::new(channel))
    })
}

fn unavailable() -> Box<dyn AutomationConnector> {
    Box::new(|| -> ControlsResult<Box<dyn AutomationChannel>> {
        Err(ControlsError::Unavailable("no word processor".to_string()))
    })
}

fn document_xml(path: &Path) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[test]
fn test_validate_only_reports_logo_and_warnings() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());
    let out = temp.path().join("out/form.docx");

    let outcome = generator(&temp, GeneratorConfig::default())
        .run(&GenerationRequest::new(&spec, &out).validate_only())
        .unwrap();

    match outcome {
        GenerationOutcome::Validated { logo, warnings } => {
            assert!(logo.ends_with("forms/assets/logo.png"));
            assert_eq!(warnings.len(), 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!out.exists());
}

#[test]
fn test_native_engine_writes_controls() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());
    let out = temp.path().join("out/form.docx");

    let outcome = generator(&temp, GeneratorConfig::default())
        .run(&GenerationRequest::new(&spec, &out))
        .unwrap();

    assert!(matches!(
        outcome,
        GenerationOutcome::Interactive { ref report, .. } if report.controls_inserted == 3
    ));
    let xml = document_xml(&out);
    assert_eq!(xml.matches("<w:sdt>").count(), 3);
    assert!(!xml.contains("[[FIELD:"));
}

#[test]
fn test_no_controls_writes_fallback() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());
    let out = temp.path().join("out/form.docx");

    let outcome = generator(&temp, GeneratorConfig::default())
        .run(&GenerationRequest::new(&spec, &out).no_controls())
        .unwrap();

    match outcome {
        GenerationOutcome::Fallback { report, reason, .. } => {
            assert_eq!(report.replacements, 3);
            assert_eq!(reason, FallbackReason::Requested);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    let xml = document_xml(&out);
    assert_eq!(xml.matches("[ ]").count(), 2);
    assert!(!xml.contains("<w:sdt>"));
}

#[test]
fn test_unavailable_automation_fails_by_default() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());
    let out = temp.path().join("form.docx");

    let generator = Generator::with_connector(
        GeneratorConfig::default(),
        temp.path(),
        unavailable(),
    );
    let error = generator.run(&GenerationRequest::new(&spec, &out)).unwrap_err();

    assert!(matches!(
        error,
        CoreError::Controls(ControlsError::Unavailable(_))
    ));
    assert!(!out.exists());
}

#[test]
fn test_unavailable_automation_falls_back_when_configured() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());
    let out = temp.path().join("form.docx");

    let config =
        GeneratorConfig::from_toml("[automation]\nfallback_on_unavailable = true\n").unwrap();
    let generator = Generator::with_connector(config, temp.path(), unavailable());
    let outcome = generator.run(&GenerationRequest::new(&spec, &out)).unwrap();

    assert!(matches!(
        outcome,
        GenerationOutcome::Fallback {
            reason: FallbackReason::AutomationUnavailable(_),
            ..
        }
    ));
    assert!(out.is_file());
}

#[test]
fn test_unresolved_markers_still_tear_down() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());
    let out = temp.path().join("form.docx");

    let mut channel = MockChannel::new();
    channel
        .expect_document_format()
        .return_const(DocumentFormat::Docx);
    channel
        .expect_open()
        .withf(|path: &Path| path.extension().map_or(false, |ext| ext == "docx") && path.is_file())
        .times(1)
        .returning(|_| Ok(DocumentHandle(1)));
    channel.expect_search().returning(|_, _, _| Ok(None));
    channel.expect_save_as().times(0);
    channel.expect_close().times(1).returning(|_| Ok(()));
    channel.expect_quit().times(1).returning(|| Ok(()));

    let generator =
        Generator::with_connector(GeneratorConfig::default(), temp.path(), connector_once(channel));
    let error = generator.run(&GenerationRequest::new(&spec, &out)).unwrap_err();

    match error {
        CoreError::Controls(ControlsError::UnresolvedMarkers(problems)) => {
            assert_eq!(problems.len(), 3);
            assert_eq!(problems[0], "marker not found: [[FIELD:name]]");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_failed_edit_still_quits() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());
    let out = temp.path().join("form.docx");

    let mut channel = MockChannel::new();
    channel
        .expect_document_format()
        .return_const(DocumentFormat::Snapshot);
    channel.expect_open().returning(|_| Ok(DocumentHandle(9)));
    channel
        .expect_search()
        .returning(|_, text, from| Ok((from == 0).then(|| TextRange::new(10, 10 + text.len()))));
    channel
        .expect_insert_control()
        .returning(|_, _, _| Err(ControlsError::Automation("host crashed".to_string())));
    channel
        .expect_close()
        .times(1)
        .returning(|_| Err(ControlsError::Automation("already gone".to_string())));
    channel.expect_quit().times(1).returning(|| Ok(()));

    let generator =
        Generator::with_connector(GeneratorConfig::default(), temp.path(), connector_once(channel));
    let error = generator.run(&GenerationRequest::new(&spec, &out)).unwrap_err();

    assert_eq!(error.to_string(), "Automation call failed: host crashed");
}

#[test]
fn test_invalid_spec_is_spec_error() {
    let temp = tempdir().unwrap();
    let spec = temp.path().join("spec.json");
    fs::write(&spec, r#"{"metadata": {}}"#).unwrap();

    let error = generator(&temp, GeneratorConfig::default())
        .run(&GenerationRequest::new(&spec, temp.path().join("form.docx")))
        .unwrap_err();

    match error {
        CoreError::Spec(SpecError::Validation(errors)) => assert_eq!(errors.len(), 3),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_logo() {
    let temp = tempdir().unwrap();
    let spec = scenario_spec(temp.path());

    let error = generator(&temp, GeneratorConfig::default())
        .run(
            &GenerationRequest::new(&spec, temp.path().join("form.docx"))
                .logo("does/not/exist.png")
                .validate_only(),
        )
        .unwrap_err();

    assert!(matches!(error, CoreError::LogoNotFound { ref checked, .. } if checked.len() == 3));
    assert!(error.to_string().starts_with("Logo not found. Requested: 'does/not/exist.png'."));
}
