// Resume ingestion: upload handling and text extraction.
// Extraction is pure; the upload handler composes it with the operator notification.

pub mod document;
pub mod extractor;
pub mod handlers;
