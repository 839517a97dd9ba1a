mod office;
mod pdf;
mod text;

use std::sync::Arc;
use tracing::info;

use crate::data::{Document, DocumentFormat};
use crate::error::PipelineError;
use crate::ocr::{OcrEngine, Tesseract};
use crate::settings::Settings;

pub use pdf::{LopdfRenderer, PdfPage, PdfRenderer};

/// Turns a classified document into raw text.
#[derive(Clone)]
pub struct Extractor {
    renderer: Arc<dyn PdfRenderer>,
    ocr: Arc<dyn OcrEngine>,
}

impl Extractor {
    pub fn new(renderer: Arc<dyn PdfRenderer>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { renderer, ocr }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(LopdfRenderer::new(settings.pdf_dpi)),
            Arc::new(Tesseract::new(settings.ocr_languages.clone()).with_dpi(settings.pdf_dpi)),
        )
    }

    pub async fn extract(
        &self,
        document: &Document,
        format: DocumentFormat,
    ) -> Result<String, PipelineError> {
        info!(
            "extract: {} as {} ({} bytes)",
            document.filename(),
            format.as_str(),
            document.bytes().len()
        );
        match format {
            DocumentFormat::Plain => text::decode_plain(document.bytes()),
            DocumentFormat::Structured => office::parse_paragraphs(document.bytes())
                .map(|paragraphs| paragraphs.join("\n"))
                .map_err(PipelineError::extraction),
            DocumentFormat::Pdf => {
                pdf::extract_pdf_text(document.bytes(), self.renderer.clone(), self.ocr.as_ref())
                    .await
                    .map_err(PipelineError::extraction)
            }
            DocumentFormat::Unsupported => Err(PipelineError::UnsupportedFormat {
                filename: document.filename().to_string(),
            }),
        }
    }
}
