//! Errors raised inside the extraction pipeline.
//!
//! These never cross the [`TextExtractor`](crate::TextExtractor) boundary:
//! every failure is turned into a readable placeholder string there.

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is not valid UTF-8 text")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("DOCX error: {0}")]
    Docx(String),
    #[error("OCR error: {0}")]
    Ocr(String),
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),
}

impl From<lopdf::Error> for ExtractError {
    fn from(err: lopdf::Error) -> Self {
        ExtractError::Pdf(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        ExtractError::Docx(err.to_string())
    }
}

impl From<quick_xml::Error> for ExtractError {
    fn from(err: quick_xml::Error) -> Self {
        ExtractError::Docx(err.to_string())
    }
}
