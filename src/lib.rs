use anyhow::{anyhow, Result};
use std::path::Path;

pub mod data;
pub mod error;
pub mod extract;
pub mod logging;
pub mod ocr;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod settings;
mod translator;

#[cfg(test)]
mod test_util;

pub use data::{detect_format, Document, DocumentFormat};
pub use error::PipelineError;
pub use extract::{Extractor, LopdfRenderer, PdfPage, PdfRenderer};
pub use ocr::{OcrEngine, OcrFuture, Tesseract};
pub use pipeline::{Pipeline, PipelineResponse, PipelineResult};
pub use providers::{ProviderEndpoint, RequestShape, TranslationRequest, Workload};
pub use settings::Settings;
pub use translator::Translator;

#[derive(Debug, Clone)]
pub struct Config {
    pub lang: String,
    pub data: Option<String>,
    pub settings_path: Option<String>,
    pub show_providers: bool,
}

/// One-shot translation for the command line. Returns the pipeline's wire
/// shape as pretty JSON, or the provider list with `show_providers`.
pub async fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    if config.show_providers {
        return Ok(format_providers(&settings));
    }

    let pipeline = Pipeline::from_settings(&settings);
    let result = match config.data.as_deref() {
        Some(path) => {
            let document = Document::load(Path::new(path))?;
            pipeline.translate_document(&document, &config.lang).await
        }
        None => {
            let input = input.unwrap_or_default();
            if input.trim().is_empty() {
                return Err(anyhow!("stdin is empty"));
            }
            pipeline.translate_text(&input, &config.lang).await
        }
    };

    Ok(serde_json::to_string_pretty(&result.into_response())?)
}

fn format_providers(settings: &Settings) -> String {
    if settings.providers.is_empty() {
        return "no providers configured".to_string();
    }
    settings
        .providers
        .iter()
        .enumerate()
        .map(|(idx, provider)| format!("{}. {}", idx + 1, provider.describe()))
        .collect::<Vec<_>>()
        .join("\n")
}
