//! Document Extractor — turns an uploaded PDF or DOCX into plain text.
//!
//! Extraction has no side effects. Operator notification is a separate step
//! composed by the upload handler, so this module is testable without a mail
//! transport.

use std::panic::{self, AssertUnwindSafe};

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use thiserror::Error;

use crate::ingest::document::{DocumentFormat, UploadedDocument};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported file type for '{0}' (expected .pdf or .docx)")]
    UnsupportedFormat(String),

    #[error("malformed PDF: {0}")]
    Pdf(String),

    #[error("malformed DOCX: {0}")]
    Docx(String),
}

/// Extracts the visible text of a document. Deterministic for identical input.
///
/// A document that decodes cleanly but carries no text yields an empty string;
/// only undecodable input is an error.
pub fn extract(document: &UploadedDocument) -> Result<String, DecodeError> {
    match document.format {
        DocumentFormat::Pdf => extract_pdf(&document.bytes),
        DocumentFormat::Docx => extract_docx(&document.bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DecodeError> {
    // The PDF decoder panics on some malformed font programs; treat that as bad input.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| DecodeError::Pdf("decoder aborted on malformed content".to_string()))?
    .map_err(|e| DecodeError::Pdf(e.to_string()))?;

    Ok(join_pages(pages))
}

/// Joins per-page text in page order with `\n`.
/// A page holding only whitespace is skipped entirely; other pages are kept as decoded.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    let mut first = true;
    for page in pages {
        let text = page.as_ref();
        if text.trim().is_empty() {
            continue;
        }
        if !first {
            out.push('\n');
        }
        out.push_str(text);
        first = false;
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

/// Walks Document → Paragraph → Run → Text, one line per non-empty paragraph.
/// Table cells are visited row by row, since resumes often lay out sections in tables.
fn extract_docx(bytes: &[u8]) -> Result<String, DecodeError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| DecodeError::Docx(format!("{e:?}")))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(para) => push_paragraph(&mut lines, para),
            DocumentChild::Table(table) => push_table(&mut lines, table),
            _ => {}
        }
    }
    Ok(lines.join("\n"))
}

fn push_paragraph(lines: &mut Vec<String>, para: &Paragraph) {
    let mut text = String::new();
    collect_paragraph_children(&mut text, &para.children);
    if !text.trim().is_empty() {
        lines.push(text);
    }
}

#[allow(irrefutable_let_patterns)]
fn push_table(lines: &mut Vec<String>, table: &Table) {
    for child in &table.rows {
        let TableChild::TableRow(row) = child else {
            continue;
        };
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(para) => push_paragraph(lines, para),
                    TableCellContent::Table(nested) => push_table(lines, nested),
                    _ => {}
                }
            }
        }
    }
}

fn collect_paragraph_children(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            // Contact lines are usually hyperlinks (email, profile URLs).
            ParagraphChild::Hyperlink(link) => collect_paragraph_children(out, &link.children),
            _ => {}
        }
    }
}
