use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

use crate::data::{detect_format, Document, DocumentFormat};
use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::providers::Workload;
use crate::settings::Settings;
use crate::translator::Translator;

#[derive(Debug)]
pub enum PipelineResult {
    Translated(String),
    Failed(PipelineError),
}

impl PipelineResult {
    pub fn into_response(self) -> PipelineResponse {
        match self {
            PipelineResult::Translated(translated) => PipelineResponse::Translated { translated },
            PipelineResult::Failed(err) => PipelineResponse::Failed {
                error: err.to_string(),
            },
        }
    }
}

/// Wire form of a [`PipelineResult`]: `{"translated": ..}` or `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineResponse {
    Translated { translated: String },
    Failed { error: String },
}

/// Extraction followed by translation for one request.
///
/// Holds no per-request state, so one instance serves any number of
/// concurrent requests.
#[derive(Clone)]
pub struct Pipeline {
    extractor: Extractor,
    translator: Translator,
}

impl Pipeline {
    pub fn new(extractor: Extractor, translator: Translator) -> Self {
        Self {
            extractor,
            translator,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Extractor::from_settings(settings),
            Translator::from_settings(settings),
        )
    }

    pub async fn extract_and_translate(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        target_language: &str,
    ) -> PipelineResult {
        let document = Document::new(filename, bytes);
        self.translate_document(&document, target_language).await
    }

    pub async fn translate_document(
        &self,
        document: &Document,
        target_language: &str,
    ) -> PipelineResult {
        guarded(self.run_document(document, target_language)).await
    }

    pub async fn translate_text(&self, text: &str, target_language: &str) -> PipelineResult {
        guarded(self.run_text(text, target_language)).await
    }

    async fn run_document(
        &self,
        document: &Document,
        target_language: &str,
    ) -> Result<String, PipelineError> {
        let target_language = checked_target(target_language)?;
        let format = detect_format(document.filename());
        if format == DocumentFormat::Unsupported {
            return Err(PipelineError::UnsupportedFormat {
                filename: document.filename().to_string(),
            });
        }

        let text = self.extractor.extract(document, format).await?;
        ensure_readable(&text)?;
        info!(
            "pipeline: extracted {} chars from {}",
            text.chars().count(),
            document.filename()
        );
        self.translator
            .translate(&text, target_language, Workload::Document)
            .await
    }

    async fn run_text(&self, text: &str, target_language: &str) -> Result<String, PipelineError> {
        let target_language = checked_target(target_language)?;
        ensure_readable(text)?;
        self.translator
            .translate(text, target_language, Workload::Text)
            .await
    }
}

fn checked_target(target_language: &str) -> Result<&str, PipelineError> {
    let target_language = target_language.trim();
    if target_language.is_empty() {
        return Err(PipelineError::InvalidRequest);
    }
    Ok(target_language)
}

fn ensure_readable(text: &str) -> Result<(), PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::NoReadableText);
    }
    Ok(())
}

/// Runs one request to completion, folding errors and panics into a result.
async fn guarded<F>(run: F) -> PipelineResult
where
    F: Future<Output = Result<String, PipelineError>>,
{
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(Ok(translated)) => PipelineResult::Translated(translated),
        Ok(Err(err)) => {
            warn!("pipeline: {} ({})", err.detail(), err.kind());
            PipelineResult::Failed(err)
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|value| value.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("pipeline: internal fault: {}", message);
            PipelineResult::Failed(PipelineError::Internal)
        }
    }
}
