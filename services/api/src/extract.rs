use chrono::{DateTime, Utc};
use clap::Args;
use ecodata::config::AppConfig;
use ecodata::error::AppError;
use ecodata::extraction::{detect_file_type, ExtractionResult, FileKind, TextExtractionService};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ExtractArgs {
    /// File to run through the extraction pipeline
    pub(crate) path: PathBuf,
    /// MIME type to dispatch on. Guessed from the file extension when omitted.
    #[arg(long)]
    pub(crate) mime: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExtractionReport {
    pub(crate) file: String,
    pub(crate) kind: FileKind,
    pub(crate) mime_type: String,
    pub(crate) size_bytes: usize,
    pub(crate) extracted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub(crate) result: ExtractionResult,
}

pub(crate) async fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = TextExtractionService::from_config(&config.extraction);

    let bytes = tokio::fs::read(&args.path).await?;
    let mime_type = args.mime.unwrap_or_else(|| guess_mime(&args.path));
    let result = service.extract(&bytes, &mime_type).await;

    let file = args.path.display().to_string();
    let report = ExtractionReport {
        kind: detect_file_type(&file),
        file,
        mime_type,
        size_bytes: bytes.len(),
        extracted_at: Utc::now(),
        result,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecodata::extraction::ExtractionEngine;

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(guess_mime(Path::new("apolice.pdf")), "application/pdf");
        assert_eq!(guess_mime(Path::new("rg.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("sem-extensao")), "application/octet-stream");
    }

    #[test]
    fn report_flattens_the_extraction_result() {
        let report = ExtractionReport {
            file: "notas.txt".to_string(),
            kind: detect_file_type("notas.txt"),
            mime_type: "text/plain".to_string(),
            size_bytes: 4,
            extracted_at: Utc::now(),
            result: ExtractionResult {
                raw_text: Some("ação".to_string()),
                structured: None,
                confidence: 1.0,
                engine: ExtractionEngine::Passthrough,
                duration_ms: 0,
            },
        };

        let json = serde_json::to_value(&report).expect("serializes");
        assert_eq!(json["kind"], "text");
        assert_eq!(json["mimeType"], "text/plain");
        assert_eq!(json["sizeBytes"], 4);
        assert_eq!(json["rawText"], "ação");
        assert_eq!(json["engine"], "passthrough");
    }
}
