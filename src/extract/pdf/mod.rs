mod render;

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::ocr::OcrEngine;

pub use render::LopdfRenderer;

/// One page as seen by the renderer, with whatever text is embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    pub number: u32,
    pub text: String,
}

/// Access to the pages of a PDF.
///
/// `load` returns pages in page order. `rasterize` renders a page returned
/// by `load` to a PNG bitmap.
pub trait PdfRenderer: Send + Sync {
    fn load(&self, pdf: &[u8]) -> Result<Vec<PdfPage>>;
    fn rasterize(&self, pdf: &[u8], page: u32) -> Result<Vec<u8>>;
}

/// Concatenates page text in page order, running OCR on pages that carry
/// no embedded text. Page text is appended as is.
pub(crate) async fn extract_pdf_text(
    pdf: &[u8],
    renderer: Arc<dyn PdfRenderer>,
    ocr: &dyn OcrEngine,
) -> Result<String> {
    let pdf: Arc<[u8]> = Arc::from(pdf);
    let pages = {
        let (pdf, renderer) = (pdf.clone(), renderer.clone());
        run_blocking(move || renderer.load(&pdf))
            .await
            .with_context(|| "failed to load pdf")?
    };
    debug!("pdf: {} page(s)", pages.len());

    let mut text = String::new();
    for page in pages {
        if !page.text.trim().is_empty() {
            debug!("pdf page {}: embedded text", page.number);
            text.push_str(&page.text);
            continue;
        }

        debug!("pdf page {}: no embedded text, running ocr", page.number);
        let number = page.number;
        let image = {
            let (pdf, renderer) = (pdf.clone(), renderer.clone());
            run_blocking(move || renderer.rasterize(&pdf, number))
                .await
                .with_context(|| format!("failed to rasterize pdf page {}", number))?
        };
        let recognized = ocr
            .recognize(&image)
            .await
            .with_context(|| format!("ocr failed on pdf page {}", number))?;
        text.push_str(&recognized);
    }
    Ok(text)
}

/// Renderer calls shell out and parse whole files, so they stay off the
/// async workers. A panic is resumed on the caller.
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => Err(anyhow!("pdf task failed: {}", err)),
    }
}
