use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{run_tool, ToolError};
use crate::model::RawDocument;
use crate::services::normalize::{write_working_file, DocumentNormalizer, NormalizedDocument};

/// Re-rasterizes and OCRs the working file with a `pypdfocr`-style tool.
///
/// The tool is invoked as `<bin> <file>` and writes `<stem>_ocr.pdf` next to it.
pub struct OcrNormalizer {
    bin: PathBuf,
}

impl OcrNormalizer {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

pub(crate) fn ocr_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
    input.with_file_name(format!("{stem}_ocr.pdf"))
}

#[async_trait]
impl DocumentNormalizer for OcrNormalizer {
    async fn normalize(
        &self,
        document: &RawDocument,
        workdir: &Path,
    ) -> Result<NormalizedDocument, ToolError> {
        let input = write_working_file(document, workdir).await?;
        debug!(locator = %document.locator, tool = %self.bin.display(), "running OCR");
        run_tool(&self.bin, &[input.as_path()], Some(workdir)).await?;

        let output = ocr_output_path(&input);
        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(ToolError::MissingOutput {
                tool: self.bin.display().to_string(),
                path: output.display().to_string(),
            });
        }
        Ok(NormalizedDocument { path: output })
    }

    fn name(&self) -> &'static str {
        "ocr"
    }
}

/// Skips de-locking and hands the download straight to text extraction.
pub struct PassthroughNormalizer;

#[async_trait]
impl DocumentNormalizer for PassthroughNormalizer {
    async fn normalize(
        &self,
        document: &RawDocument,
        workdir: &Path,
    ) -> Result<NormalizedDocument, ToolError> {
        let path = write_working_file(document, workdir).await?;
        Ok(NormalizedDocument { path })
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
