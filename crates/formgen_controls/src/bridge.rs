//! Out-of-process automation through a helper command.
//!
//! The helper owns the actual word processor session. Requests and
//! responses are single-line JSON objects over the helper's stdin and
//! stdout:
//!
//! ```text
//! > {"op":"open","path":"/tmp/formgen_form_x/base.docx"}
//! < {"ok":true,"handle":1}
//! > {"op":"search","handle":1,"text":"[[FIELD:name]]","from":0}
//! < {"ok":true,"range":{"start":120,"end":134}}
//! > {"op":"quit"}
//! < {"ok":true}
//! ```
//!
//! Failures are answered with `{"ok":false,"error":"..."}`.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::automation::{
    AutomationChannel, ControlRequest, DocumentFormat, DocumentHandle, TextRange,
};
use crate::error::{ControlsError, ControlsResult};

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeRequest<'a> {
    Open {
        path: &'a Path,
    },
    Search {
        handle: DocumentHandle,
        text: &'a str,
        from: usize,
    },
    ReplaceText {
        handle: DocumentHandle,
        range: TextRange,
        text: &'a str,
    },
    InsertControl {
        handle: DocumentHandle,
        range: TextRange,
        control: &'a ControlRequest,
    },
    SaveAs {
        handle: DocumentHandle,
        path: &'a Path,
    },
    Close {
        handle: DocumentHandle,
    },
    Quit,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    handle: Option<DocumentHandle>,
    #[serde(default)]
    range: Option<TextRange>,
}

/// Automation channel backed by a spawned helper process.
pub struct BridgeAutomation {
    command: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    finished: bool,
}

impl BridgeAutomation {
    /// Start the helper. A helper that cannot be started means automation
    /// is unavailable.
    pub fn spawn(command: &str, args: &[String]) -> ControlsResult<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                ControlsError::Unavailable(format!("failed to start '{}': {}", command, e))
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                return Err(ControlsError::Unavailable(format!(
                    "no stdio pipes to '{}'",
                    command
                )));
            }
        };

        info!("Started automation bridge '{}'", command);
        Ok(Self {
            command: command.to_string(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            finished: false,
        })
    }

    fn call(&mut self, request: &BridgeRequest<'_>) -> ControlsResult<BridgeResponse> {
        let mut line = serde_json::to_string(request)?;
        debug!("bridge > {}", line);
        line.push('\n');
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            ControlsError::Automation(format!("bridge '{}' has already quit", self.command))
        })?;
        stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.flush())
            .map_err(|e| {
                ControlsError::Automation(format!("bridge '{}' stopped reading: {}", self.command, e))
            })?;

        let mut reply = String::new();
        let read = self.stdout.read_line(&mut reply)?;
        if read == 0 {
            return Err(ControlsError::Automation(format!(
                "bridge '{}' closed its output",
                self.command
            )));
        }
        debug!("bridge < {}", reply.trim_end());

        let response: BridgeResponse = serde_json::from_str(reply.trim())?;
        if !response.ok {
            return Err(ControlsError::Automation(
                response
                    .error
                    .unwrap_or_else(|| "unspecified bridge error".to_string()),
            ));
        }
        Ok(response)
    }
}

impl AutomationChannel for BridgeAutomation {
    fn document_format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn open(&mut self, path: &Path) -> ControlsResult<DocumentHandle> {
        self.call(&BridgeRequest::Open { path })?
            .handle
            .ok_or_else(|| ControlsError::Automation("open returned no handle".to_string()))
    }

    fn search(
        &mut self,
        handle: DocumentHandle,
        text: &str,
        from: usize,
    ) -> ControlsResult<Option<TextRange>> {
        Ok(self
            .call(&BridgeRequest::Search { handle, text, from })?
            .range)
    }

    fn replace_text(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        text: &str,
    ) -> ControlsResult<()> {
        self.call(&BridgeRequest::ReplaceText {
            handle,
            range,
            text,
        })
        .map(|_| ())
    }

    fn insert_control(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        request: &ControlRequest,
    ) -> ControlsResult<()> {
        self.call(&BridgeRequest::InsertControl {
            handle,
            range,
            control: request,
        })
        .map(|_| ())
    }

    fn save_as(&mut self, handle: DocumentHandle, path: &Path) -> ControlsResult<()> {
        self.call(&BridgeRequest::SaveAs { handle, path }).map(|_| ())
    }

    fn close(&mut self, handle: DocumentHandle) -> ControlsResult<()> {
        self.call(&BridgeRequest::Close { handle }).map(|_| ())
    }

    fn quit(&mut self) -> ControlsResult<()> {
        if self.finished {
            return Ok(());
        }
        let result = self.call(&BridgeRequest::Quit).map(|_| ());
        // closing stdin lets the helper see end of input
        self.stdin.take();
        self.finished = true;
        self.child.wait()?;
        result
    }
}

impl Drop for BridgeAutomation {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Automation bridge '{}' dropped without quit, killing it", self.command);
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
