mod tesseract;

use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

pub use tesseract::{list_tesseract_languages, Tesseract};

pub type OcrFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Turns a rasterized page into text.
///
/// Implementations are best-effort: an image with nothing recognizable
/// yields an empty string, not an error. Errors are reserved for an engine
/// that could not run at all.
pub trait OcrEngine: Send + Sync {
    fn recognize<'a>(&'a self, image_png: &'a [u8]) -> OcrFuture<'a>;
}
