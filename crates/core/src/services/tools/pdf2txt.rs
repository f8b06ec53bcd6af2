use std::path::PathBuf;

use async_trait::async_trait;

use super::{run_tool, ToolError};
use crate::services::normalize::{NormalizedDocument, TextExtractor};

/// Text extraction via pdfminer's `pdf2txt.py <file>`, reading stdout.
pub struct Pdf2TxtExtractor {
    bin: PathBuf,
}

impl Pdf2TxtExtractor {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl TextExtractor for Pdf2TxtExtractor {
    async fn extract(&self, document: &NormalizedDocument) -> Result<String, ToolError> {
        let output = run_tool(&self.bin, &[document.path.as_path()], None).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "pdf2txt"
    }
}
