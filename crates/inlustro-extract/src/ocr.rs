//! OCR engine trait and implementations.
//!
//! [`TesseractOcr`] shells out to the `tesseract` binary, streaming the
//! image through stdin. [`MockOcrService`] returns canned text for tests.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::ExtractError;

/// Service for recognising text in an image.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Recognise text in encoded image bytes (PNG, JPEG, ...).
    ///
    /// Returns an empty string when the image contains no text.
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractError>;
}

/// OCR through the Tesseract command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrService for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractError> {
        if image.is_empty() {
            return Err(ExtractError::Ocr("Empty image data".to_string()));
        }

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExtractError::OcrUnavailable(format!("{}: {}", self.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::debug!(chars = text.len(), "OCR pass complete");
        Ok(text)
    }
}

/// Mock OCR service returning deterministic text.
#[derive(Debug, Clone)]
pub struct MockOcrService {
    response: Result<String, String>,
}

impl MockOcrService {
    /// Mock that returns `text` for any non-empty image.
    pub fn with_text(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
        }
    }

    /// Mock that finds no text in any image.
    pub fn empty() -> Self {
        Self {
            response: Ok(String::new()),
        }
    }

    /// Mock whose engine always fails.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl OcrService for MockOcrService {
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractError> {
        if image.is_empty() {
            return Err(ExtractError::Ocr("Empty image data".to_string()));
        }
        self.response.clone().map_err(ExtractError::Ocr)
    }
}
