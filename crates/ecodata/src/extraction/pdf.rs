use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object};
use serde_json::{json, Map, Value};

use super::{ExtractionError, PdfEngine, PdfOutput};

/// Pure-Rust PDF text extraction backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

#[async_trait]
impl PdfEngine for LopdfEngine {
    async fn parse(&self, bytes: &[u8]) -> Result<PdfOutput, ExtractionError> {
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || parse_document(&bytes))
            .await
            .map_err(|err| ExtractionError::Task(err.to_string()))?
    }
}

fn parse_document(bytes: &[u8]) -> Result<PdfOutput, ExtractionError> {
    let document =
        Document::load_mem(bytes).map_err(|err| ExtractionError::Parse(err.to_string()))?;

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    let text = if pages.is_empty() {
        String::new()
    } else {
        document
            .extract_text(&pages)
            .map_err(|err| ExtractionError::Parse(err.to_string()))?
    };

    Ok(PdfOutput {
        text,
        pages: pages.len(),
        info: document_info(&document),
    })
}

fn document_info(document: &Document) -> Map<String, Value> {
    let dictionary: Option<&Dictionary> = match document.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => document
            .get_object(*id)
            .ok()
            .and_then(|object| object.as_dict().ok()),
        Ok(Object::Dictionary(dictionary)) => Some(dictionary),
        _ => None,
    };

    let mut info = Map::new();
    if let Some(dictionary) = dictionary {
        for (key, value) in dictionary.iter() {
            if let Some(value) = info_value(value) {
                info.insert(String::from_utf8_lossy(key).into_owned(), value);
            }
        }
    }
    info
}

fn info_value(object: &Object) -> Option<Value> {
    match object {
        Object::String(bytes, _) => Some(Value::String(decode_pdf_string(bytes))),
        Object::Name(name) => Some(Value::String(String::from_utf8_lossy(name).into_owned())),
        Object::Integer(value) => Some(json!(value)),
        Object::Real(value) => Some(json!(value)),
        Object::Boolean(value) => Some(json!(value)),
        _ => None,
    }
}

/// Text strings are UTF-16BE when they carry a byte-order mark, PDFDocEncoding otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}
