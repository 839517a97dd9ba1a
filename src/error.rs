use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every way a document translation can end without a translation.
///
/// The `Display` text is the stable message sent to callers; diagnostic
/// detail lives in the fields and `source()` chain and is only logged.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file format")]
    UnsupportedFormat { filename: String },

    #[error("Failed to decode text file as UTF-8")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Failed to extract text from document")]
    Extraction(#[source] BoxError),

    #[error("No readable text found in document")]
    NoReadableText,

    #[error("Translation service did not respond")]
    ProviderUnavailable,

    #[error("Target language is required")]
    InvalidRequest,

    #[error("Internal error while processing document")]
    Internal,
}

impl PipelineError {
    pub(crate) fn extraction(err: anyhow::Error) -> Self {
        PipelineError::Extraction(err.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat { .. } => "unsupported_format",
            PipelineError::Decode(_) => "decode_error",
            PipelineError::Extraction(_) => "extraction_error",
            PipelineError::NoReadableText => "no_readable_text",
            PipelineError::ProviderUnavailable => "provider_unavailable",
            PipelineError::InvalidRequest => "invalid_request",
            PipelineError::Internal => "internal",
        }
    }

    /// Message plus the full cause chain, for logs.
    pub fn detail(&self) -> String {
        let mut parts = vec![self.to_string()];
        if let PipelineError::UnsupportedFormat { filename } = self {
            parts.push(format!("filename: {}", filename));
        }
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            parts.push(err.to_string());
            source = err.source();
        }
        parts.join(": ")
    }
}
