//! # Document Extraction
//!
//! Converts uploaded PDF, DOCX and plain-text documents into text. Each format
//! is isolated behind a cargo feature (`pdf`, `docx`); when a format is not
//! compiled in, extraction reports `Extraction::Unsupported` rather than
//! failing. Nothing in this module returns an error or panics past its
//! boundary: every outcome is an `Extraction` value.

use std::path::Path;

use tracing::{debug, warn};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word processing document
    Docx,
    /// UTF-8 plain text
    Text,
}

impl DocumentFormat {
    /// Detect the format from a file name's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();

        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// An uploaded document
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// Original file name, used for format detection
    pub filename: String,

    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    /// Create a document from a name and its bytes
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }
}

/// Outcome of extracting text from a document
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Extracted plain text
    Text(String),

    /// The format is unknown or its support is not compiled in
    Unsupported(String),

    /// The format is supported but the bytes could not be read
    Failed(String),
}

impl Extraction {
    /// The extracted text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Extracts plain text from uploaded documents
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Whether support for `format` is compiled in
    pub fn supports(&self, format: DocumentFormat) -> bool {
        match format {
            DocumentFormat::Pdf => cfg!(feature = "pdf"),
            DocumentFormat::Docx => cfg!(feature = "docx"),
            DocumentFormat::Text => true,
        }
    }

    /// Extract text from `bytes`, detecting the format from `filename`
    pub fn extract(&self, bytes: &[u8], filename: &str) -> Extraction {
        let Some(format) = DocumentFormat::from_filename(filename) else {
            return Extraction::Unsupported(format!("Unsupported format: {filename}"));
        };

        if !self.supports(format) {
            warn!("{:?} support not compiled in, skipping {}", format, filename);
            return Extraction::Unsupported(format!("{format:?} support not available"));
        }

        debug!("Extracting {} ({} bytes) as {:?}", filename, bytes.len(), format);
        let result = match format {
            DocumentFormat::Pdf => extract_pdf(bytes),
            DocumentFormat::Docx => extract_docx(bytes),
            DocumentFormat::Text => String::from_utf8(bytes.to_vec())
                .map_err(|e| format!("Invalid UTF-8 in {filename}: {e}")),
        };

        match result {
            Ok(text) => Extraction::Text(text),
            Err(reason) => Extraction::Failed(reason),
        }
    }

    /// Extract text from a `DocumentInput`
    pub fn extract_document(&self, document: &DocumentInput) -> Extraction {
        self.extract(&document.bytes, &document.filename)
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| "PDF parser panicked".to_string())?
        .map(|text| text.trim().to_string())
        .map_err(|e| format!("Unable to extract text from PDF: {e}"))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<String, String> {
    Err("PDF support not available".to_string())
}

#[cfg(feature = "docx")]
fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};

    fn paragraph_text(paragraph: &Paragraph) -> String {
        let mut buffer = String::new();
        for child in &paragraph.children {
            if let ParagraphChild::Run(run) = child {
                for run_child in &run.children {
                    if let RunChild::Text(text) = run_child {
                        buffer.push_str(&text.text);
                    }
                }
            }
        }
        buffer.trim().to_string()
    }

    let docx = docx_rs::read_docx(bytes).map_err(|e| format!("Unable to read DOCX: {e}"))?;
    let mut paragraphs = Vec::new();

    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => paragraphs.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => {
                for row_child in &table.rows {
                    #[allow(irrefutable_let_patterns)]
                    let TableChild::TableRow(row) = row_child else {
                        continue;
                    };
                    for cell_child in &row.cells {
                        #[allow(irrefutable_let_patterns)]
                        let TableRowChild::TableCell(cell) = cell_child else {
                            continue;
                        };
                        for content in &cell.children {
                            if let TableCellContent::Paragraph(paragraph) = content {
                                paragraphs.push(paragraph_text(paragraph));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_bytes: &[u8]) -> Result<String, String> {
    Err("DOCX support not available".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(DocumentFormat::from_filename("Study Plan.PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_filename("plan.docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_filename("notes.txt"), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_filename("slides.pptx"), None);
        assert_eq!(DocumentFormat::from_filename("README"), None);
    }

    #[test]
    fn test_plain_text_extraction() {
        let extractor = DocumentExtractor::new();
        let extraction = extractor.extract("Students will analyse markets.".as_bytes(), "plan.txt");
        assert_eq!(extraction.text(), Some("Students will analyse markets."));
    }

    #[test]
    fn test_unsupported_format() {
        let extractor = DocumentExtractor::new();
        let extraction = extractor.extract(b"binary", "slides.pptx");
        assert!(matches!(extraction, Extraction::Unsupported(_)));
        assert_eq!(extraction.text(), None);
    }

    #[test]
    fn test_invalid_utf8_text_fails() {
        let extractor = DocumentExtractor::new();
        let extraction = extractor.extract(&[0xff, 0xfe, 0x00], "broken.txt");
        assert!(matches!(extraction, Extraction::Failed(_)));
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_garbage_docx_fails() {
        let extractor = DocumentExtractor::new();
        let extraction = extractor.extract(b"definitely not a zip archive", "plan.docx");
        assert!(matches!(extraction, Extraction::Failed(_)));
    }

    #[test]
    fn test_extract_document_input() {
        let extractor = DocumentExtractor::new();
        let document = DocumentInput::new("outcomes.txt", "Apply econometric methods to data.");
        assert!(matches!(extractor.extract_document(&document), Extraction::Text(_)));
    }
}
