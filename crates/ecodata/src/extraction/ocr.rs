use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::{ExtractionError, OcrEngine, OcrOutput};
use crate::config::ExtractionConfig;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const WORD_LEVEL: u32 = 5;

/// Drives the `tesseract` executable, reading the image from stdin and TSV from stdout.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.tesseract_binary.clone(),
            config.ocr_language.clone(),
            config.ocr_timeout,
        )
    }

    async fn run(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l"])
            .arg(&self.language)
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let job = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(bytes).await?;
                stdin.shutdown().await?;
            }
            child.wait_with_output().await
        };

        let output = match timeout(self.timeout, job).await {
            Ok(output) => output?,
            Err(_) => return Err(ExtractionError::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            return Err(ExtractionError::Process {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, bytes: &[u8]) -> Result<OcrOutput, ExtractionError> {
        let tsv = self.run(bytes).await?;
        parse_tsv(&tsv)
    }

    async fn probe(&self) -> Result<(), ExtractionError> {
        let child = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        match timeout(PROBE_TIMEOUT, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(ExtractionError::Process {
                status: output.status.to_string(),
                stderr: String::new(),
            }),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(ExtractionError::Timeout(PROBE_TIMEOUT.as_secs())),
        }
    }
}

type LineKey = (u32, u32, u32, u32);

/// Reassembles text and word confidences from tesseract's TSV report.
///
/// Words on the same (page, block, paragraph, line) are joined with spaces, lines with
/// newlines, and paragraphs with a blank line. Rows with a negative confidence are layout
/// rows and do not count toward the mean.
pub fn parse_tsv(tsv: &str) -> Result<OcrOutput, ExtractionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(tsv.as_bytes());

    let mut text = String::new();
    let mut previous: Option<LineKey> = None;
    let mut words = 0usize;
    let mut confidence_sum = 0.0f64;
    let mut confident_words = 0usize;

    for row in reader.records() {
        let row = row.map_err(|err| ExtractionError::Parse(err.to_string()))?;
        let number = |index: usize| row.get(index).and_then(|raw| raw.trim().parse::<u32>().ok());

        if number(0) != Some(WORD_LEVEL) {
            continue;
        }
        let word = row.get(11).map(str::trim).unwrap_or_default();
        if word.is_empty() {
            continue;
        }

        let key: LineKey = (
            number(1).unwrap_or_default(),
            number(2).unwrap_or_default(),
            number(3).unwrap_or_default(),
            number(4).unwrap_or_default(),
        );
        if let Some(last) = previous {
            let separator = if (last.0, last.1, last.2) != (key.0, key.1, key.2) {
                "\n\n"
            } else if last.3 != key.3 {
                "\n"
            } else {
                " "
            };
            text.push_str(separator);
        }
        text.push_str(word);
        previous = Some(key);
        words += 1;

        if let Some(confidence) = row
            .get(10)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|confidence| *confidence >= 0.0)
        {
            confidence_sum += confidence;
            confident_words += 1;
        }
    }

    let mean_confidence = if confident_words == 0 {
        0.0
    } else {
        confidence_sum / confident_words as f64
    };

    Ok(OcrOutput {
        text,
        words,
        mean_confidence,
    })
}
