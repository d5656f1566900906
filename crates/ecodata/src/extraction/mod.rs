//! Dispatches uploaded bytes to a PDF parser, an OCR engine, or a UTF-8 passthrough
//! based on the declared MIME type.
//!
//! [`TextExtractionService::extract`] never fails: every problem is folded into the
//! result's engine tag with zero confidence and no text.

mod ocr;
mod pdf;

pub use ocr::{parse_tsv, TesseractEngine};
pub use pdf::LopdfEngine;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

use crate::config::ExtractionConfig;

/// Provenance tag recorded with every extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractionEngine {
    #[serde(rename = "pdf-parse")]
    PdfParse,
    #[serde(rename = "tesseract")]
    Tesseract,
    #[serde(rename = "passthrough")]
    Passthrough,
    #[serde(rename = "unsupported")]
    Unsupported,
    #[serde(rename = "pdf-parse-error")]
    PdfParseError,
    #[serde(rename = "tesseract-error")]
    TesseractError,
    #[serde(rename = "error")]
    Error,
}

impl ExtractionEngine {
    pub const fn label(self) -> &'static str {
        match self {
            ExtractionEngine::PdfParse => "pdf-parse",
            ExtractionEngine::Tesseract => "tesseract",
            ExtractionEngine::Passthrough => "passthrough",
            ExtractionEngine::Unsupported => "unsupported",
            ExtractionEngine::PdfParseError => "pdf-parse-error",
            ExtractionEngine::TesseractError => "tesseract-error",
            ExtractionEngine::Error => "error",
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(
            self,
            ExtractionEngine::PdfParse | ExtractionEngine::Tesseract | ExtractionEngine::Passthrough
        )
    }
}

impl std::fmt::Display for ExtractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub raw_text: Option<String>,
    pub structured: Option<Value>,
    pub confidence: f64,
    pub engine: ExtractionEngine,
    pub duration_ms: u64,
}

impl ExtractionResult {
    fn empty(engine: ExtractionEngine) -> Self {
        Self {
            raw_text: None,
            structured: None,
            confidence: 0.0,
            engine,
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.engine.is_success()
    }
}

/// Parsed PDF content.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOutput {
    pub text: String,
    pub pages: usize,
    pub info: Map<String, Value>,
}

/// Recognized image content. `mean_confidence` is on the 0-100 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub words: usize,
    pub mean_confidence: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("engine io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine timed out after {0} seconds")]
    Timeout(u64),
    #[error("engine exited with {status}: {stderr}")]
    Process { status: String, stderr: String },
    #[error("unable to parse input: {0}")]
    Parse(String),
    #[error("engine task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn parse(&self, bytes: &[u8]) -> Result<PdfOutput, ExtractionError>;
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, bytes: &[u8]) -> Result<OcrOutput, ExtractionError>;

    /// Reports whether the engine can currently serve requests.
    async fn probe(&self) -> Result<(), ExtractionError> {
        Ok(())
    }
}

/// Coarse classification of a filename by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
    Text,
    Unknown,
}

pub fn detect_file_type(filename: &str) -> FileKind {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => FileKind::Pdf,
        Some("png" | "jpg" | "jpeg" | "webp" | "tiff" | "bmp" | "gif") => FileKind::Image,
        Some("txt" | "csv" | "json" | "xml") => FileKind::Text,
        _ => FileKind::Unknown,
    }
}

const PDF_CONFIDENCE: f64 = 0.85;

#[derive(Clone)]
pub struct TextExtractionService {
    pdf: Arc<dyn PdfEngine>,
    ocr: Arc<dyn OcrEngine>,
}

impl TextExtractionService {
    pub fn new(pdf: Arc<dyn PdfEngine>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { pdf, ocr }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            Arc::new(LopdfEngine),
            Arc::new(TesseractEngine::from_config(config)),
        )
    }

    pub fn ocr_engine(&self) -> Arc<dyn OcrEngine> {
        Arc::clone(&self.ocr)
    }

    pub async fn extract(&self, bytes: &[u8], mime_type: &str) -> ExtractionResult {
        let started = Instant::now();

        let mut result = match AssertUnwindSafe(self.dispatch(bytes, mime_type))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(mime_type, "extraction engine panicked");
                ExtractionResult::empty(ExtractionEngine::Error)
            }
        };

        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result
    }

    async fn dispatch(&self, bytes: &[u8], mime_type: &str) -> ExtractionResult {
        let Ok(mime) = mime_type.trim().parse::<mime::Mime>() else {
            return ExtractionResult::empty(ExtractionEngine::Unsupported);
        };

        if mime.essence_str().eq_ignore_ascii_case("application/pdf") {
            self.extract_pdf(bytes).await
        } else if mime.type_() == mime::IMAGE {
            self.extract_image(bytes).await
        } else if mime.type_() == mime::TEXT {
            ExtractionResult {
                raw_text: Some(String::from_utf8_lossy(bytes).into_owned()),
                structured: None,
                confidence: 1.0,
                engine: ExtractionEngine::Passthrough,
                duration_ms: 0,
            }
        } else {
            ExtractionResult::empty(ExtractionEngine::Unsupported)
        }
    }

    async fn extract_pdf(&self, bytes: &[u8]) -> ExtractionResult {
        match self.pdf.parse(bytes).await {
            Ok(output) => ExtractionResult {
                confidence: if output.text.is_empty() {
                    0.0
                } else {
                    PDF_CONFIDENCE
                },
                structured: Some(json!({ "pages": output.pages, "info": output.info })),
                raw_text: Some(output.text),
                engine: ExtractionEngine::PdfParse,
                duration_ms: 0,
            },
            Err(err) => {
                warn!(error = %err, "pdf extraction failed");
                ExtractionResult::empty(ExtractionEngine::PdfParseError)
            }
        }
    }

    async fn extract_image(&self, bytes: &[u8]) -> ExtractionResult {
        match self.ocr.recognize(bytes).await {
            Ok(output) => ExtractionResult {
                confidence: (output.mean_confidence / 100.0).clamp(0.0, 1.0),
                structured: Some(json!({
                    "words": output.words,
                    "confidence": output.mean_confidence,
                })),
                raw_text: Some(output.text),
                engine: ExtractionEngine::Tesseract,
                duration_ms: 0,
            },
            Err(err) => {
                warn!(error = %err, "ocr extraction failed");
                ExtractionResult::empty(ExtractionEngine::TesseractError)
            }
        }
    }
}
