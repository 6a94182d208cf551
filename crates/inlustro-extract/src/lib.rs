//! Text extraction for uploaded files.
//!
//! [`TextExtractor::extract`] turns an [`Upload`] into plain text the chat
//! backend can reason about. It never fails: every internal error becomes a
//! human-readable placeholder so callers can pass the result straight on.

pub mod docx;
pub mod error;
pub mod ocr;
pub mod pdf;

use std::path::Path;
use std::sync::Arc;

pub use error::ExtractError;
pub use ocr::{MockOcrService, OcrService, TesseractOcr};

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MIME: &str = "application/pdf";
pub const TEXT_MIME: &str = "text/plain";

pub const NO_IMAGE_TEXT: &str = "No text could be extracted from the image";
pub const IMAGE_FAILED: &str = "Failed to extract text from image";
pub const NO_DOCX_TEXT: &str = "No text found in DOCX file";
pub const PDF_FAILED: &str = "Failed to extract text from PDF";
pub const DOCUMENT_FAILED: &str = "Failed to extract text from document";

/// Coarse attachment category sent alongside the extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Document,
}

impl FileKind {
    pub fn tag(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Document => "document",
        }
    }
}

/// A file the user attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = guess_mime(&name).to_string();
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    pub fn kind(&self) -> FileKind {
        if self.mime_type.starts_with("image/") {
            FileKind::Image
        } else {
            FileKind::Document
        }
    }

    fn is_docx(&self) -> bool {
        self.mime_type == DOCX_MIME || self.name.to_lowercase().ends_with(".docx")
    }
}

/// Guess a MIME type from a file name's extension.
pub fn guess_mime(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" | "csv" => TEXT_MIME,
        "pdf" => PDF_MIME,
        "docx" => DOCX_MIME,
        "doc" => "application/msword",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Dispatches an upload to the matching extractor.
#[derive(Clone)]
pub struct TextExtractor {
    ocr: Arc<dyn OcrService>,
}

impl TextExtractor {
    pub fn new(ocr: Arc<dyn OcrService>) -> Self {
        Self { ocr }
    }

    /// Extract plain text from `upload`, or a placeholder when that fails.
    pub async fn extract(&self, upload: &Upload) -> String {
        match upload.kind() {
            FileKind::Image => self.extract_image(upload).await,
            FileKind::Document => self.extract_document(upload),
        }
    }

    async fn extract_image(&self, upload: &Upload) -> String {
        match self.ocr.recognize(&upload.bytes).await {
            Ok(text) if text.trim().is_empty() => NO_IMAGE_TEXT.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(file = %upload.name, error = %e, "OCR failed");
                IMAGE_FAILED.to_string()
            }
        }
    }

    fn extract_document(&self, upload: &Upload) -> String {
        if upload.mime_type == TEXT_MIME {
            return match String::from_utf8(upload.bytes.clone()) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %upload.name, error = %e, "Text file is not UTF-8");
                    DOCUMENT_FAILED.to_string()
                }
            };
        }

        if upload.mime_type == PDF_MIME {
            return match pdf::extract_pdf_text(&upload.bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %upload.name, error = %e, "PDF extraction failed");
                    PDF_FAILED.to_string()
                }
            };
        }

        if upload.is_docx() {
            return match docx::extract_docx_text(&upload.bytes) {
                Ok(text) if text.is_empty() => NO_DOCX_TEXT.to_string(),
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %upload.name, error = %e, "DOCX extraction failed");
                    DOCUMENT_FAILED.to_string()
                }
            };
        }

        tracing::debug!(file = %upload.name, mime = %upload.mime_type, "Unsupported file type");
        format!("[File content could not be extracted from {}]", upload.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn extractor(ocr: MockOcrService) -> TextExtractor {
        TextExtractor::new(Arc::new(ocr))
    }

    #[tokio::test]
    async fn test_plain_text_is_returned_verbatim() {
        let upload = Upload::new("notes.txt", TEXT_MIME, b"hello world".to_vec());
        let text = extractor(MockOcrService::empty()).extract(&upload).await;
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn test_invalid_utf8_gets_placeholder() {
        let upload = Upload::new("notes.txt", TEXT_MIME, vec![0xff, 0xfe, 0xfd]);
        let text = extractor(MockOcrService::empty()).extract(&upload).await;
        assert_eq!(text, DOCUMENT_FAILED);
    }

    #[tokio::test]
    async fn test_image_uses_ocr() {
        let upload = Upload::new("board.png", "image/png", vec![1, 2, 3]);
        let text = extractor(MockOcrService::with_text("  x + 2 = 5\n"))
            .extract(&upload)
            .await;
        assert_eq!(text, "x + 2 = 5");
    }

    #[tokio::test]
    async fn test_image_without_text() {
        let upload = Upload::new("blank.png", "image/png", vec![1]);
        let text = extractor(MockOcrService::empty()).extract(&upload).await;
        assert_eq!(text, NO_IMAGE_TEXT);
    }

    #[tokio::test]
    async fn test_ocr_failure_is_soft() {
        let upload = Upload::new("photo.jpg", "image/jpeg", vec![1]);
        let text = extractor(MockOcrService::failing("boom"))
            .extract(&upload)
            .await;
        assert_eq!(text, IMAGE_FAILED);
    }

    #[tokio::test]
    async fn test_broken_pdf_is_soft() {
        let upload = Upload::new("scan.pdf", PDF_MIME, b"%PDF-garbage".to_vec());
        let text = extractor(MockOcrService::empty()).extract(&upload).await;
        assert_eq!(text, PDF_FAILED);
    }

    #[tokio::test]
    async fn test_broken_docx_is_soft() {
        let upload = Upload::new("essay.docx", "application/octet-stream", b"nope".to_vec());
        let text = extractor(MockOcrService::empty()).extract(&upload).await;
        assert_eq!(text, DOCUMENT_FAILED);
    }

    #[tokio::test]
    async fn test_unknown_type_placeholder() {
        let upload = Upload::new("slides.pptx", "application/octet-stream", vec![0; 4]);
        let text = extractor(MockOcrService::empty()).extract(&upload).await;
        assert_eq!(text, "[File content could not be extracted from slides.pptx]");
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"hello world").unwrap();
        let upload = Upload::from_path(file.path()).await.unwrap();
        assert_eq!(upload.mime_type, TEXT_MIME);
        assert_eq!(upload.kind(), FileKind::Document);
        assert!(upload.name.ends_with(".txt"));
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("Photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime("report.pdf"), PDF_MIME);
        assert_eq!(guess_mime("essay.docx"), DOCX_MIME);
        assert_eq!(guess_mime("README"), "application/octet-stream");
    }

    #[test]
    fn test_kind_tags() {
        let image = Upload::new("a.png", "image/png", vec![]);
        let doc = Upload::new("a.pdf", PDF_MIME, vec![]);
        assert_eq!(image.kind().tag(), "image");
        assert_eq!(doc.kind().tag(), "document");
    }
}
