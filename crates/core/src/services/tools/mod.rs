//! Process-backed adapters for the OCR and text extraction tools.

mod ocr;
mod pdf2txt;

use std::path::Path;
use std::process::Output;

use thiserror::Error;
use tokio::process::Command;

pub use ocr::{OcrNormalizer, PassthroughNormalizer};
pub use pdf2txt::Pdf2TxtExtractor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("failed to spawn {tool}: {message}")]
    Spawn { tool: String, message: String },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed { tool: String, status: String, stderr: String },
    #[error("{tool} did not produce {path}")]
    MissingOutput { tool: String, path: String },
    #[error("I/O error: {0}")]
    Io(String),
}

/// Run `tool` with `args`, awaiting exit, and fail on a non-zero status.
pub(crate) async fn run_tool(
    tool: &Path,
    args: &[&Path],
    cwd: Option<&Path>,
) -> Result<Output, ToolError> {
    let mut command = Command::new(tool);
    command.args(args).kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command.output().await.map_err(|e| ToolError::Spawn {
        tool: tool.display().to_string(),
        message: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: tool.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}
