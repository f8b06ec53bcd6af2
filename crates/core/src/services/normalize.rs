use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{NormalizeMode, PortalConfig};
use crate::model::RawDocument;
use crate::services::tools::{OcrNormalizer, PassthroughNormalizer, Pdf2TxtExtractor, ToolError};

/// File name of the transient working copy inside a locator's scratch dir.
pub const WORKING_FILE: &str = "certificate.pdf";

/// A document on disk from which text can be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub path: PathBuf,
}

/// Makes a locked download text-extractable.
///
/// Implementations must only return once the output file exists.
#[async_trait]
pub trait DocumentNormalizer: Send + Sync {
    async fn normalize(
        &self,
        document: &RawDocument,
        workdir: &Path,
    ) -> Result<NormalizedDocument, ToolError>;
    fn name(&self) -> &'static str;
}

/// Binary document in, plain text out.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: &NormalizedDocument) -> Result<String, ToolError>;
    fn name(&self) -> &'static str;
}

/// Write the downloaded bytes to the working file in `workdir`.
pub async fn write_working_file(document: &RawDocument, workdir: &Path) -> Result<PathBuf, ToolError> {
    let path = workdir.join(WORKING_FILE);
    tokio::fs::write(&path, &document.bytes)
        .await
        .map_err(|e| ToolError::Io(format!("failed to write {}: {e}", path.display())))?;
    Ok(path)
}

/// Normalizer selected by `config.normalize`.
pub fn normalizer_from_config(config: &PortalConfig) -> Arc<dyn DocumentNormalizer> {
    match config.normalize {
        NormalizeMode::Ocr => Arc::new(OcrNormalizer::new(config.tools.ocr_path())),
        NormalizeMode::Passthrough => Arc::new(PassthroughNormalizer),
    }
}

pub fn extractor_from_config(config: &PortalConfig) -> Arc<dyn TextExtractor> {
    Arc::new(Pdf2TxtExtractor::new(config.tools.text_path()))
}
