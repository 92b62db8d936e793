use bytes::Bytes;
use serde::Serialize;

use crate::ingest::extractor::DecodeError;

/// Document formats accepted by the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Derives the format from the filename extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

/// A resume as received from the client. Consumed once per upload.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Bytes,
    pub filename: String,
    pub format: DocumentFormat,
}

impl UploadedDocument {
    pub fn new(bytes: Bytes, filename: impl Into<String>) -> Result<Self, DecodeError> {
        let filename = filename.into();
        let format = DocumentFormat::from_filename(&filename)
            .ok_or_else(|| DecodeError::UnsupportedFormat(filename.clone()))?;
        Ok(Self {
            bytes,
            filename,
            format,
        })
    }
}
