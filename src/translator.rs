use tracing::{info, warn};

use crate::error::PipelineError;
use crate::providers::{self, ProviderEndpoint, TranslationRequest, Workload};
use crate::settings::Settings;

/// Translates through an ordered fallback chain of providers.
///
/// Providers are tried strictly in configured order and the first usable
/// answer wins. A provider failing for any reason only moves the chain
/// along; the caller sees a failure only once every provider has failed.
#[derive(Debug, Clone)]
pub struct Translator {
    client: reqwest::Client,
    providers: Vec<ProviderEndpoint>,
}

impl Translator {
    pub fn new(providers: Vec<ProviderEndpoint>) -> Self {
        Self::with_client(reqwest::Client::new(), providers)
    }

    pub fn with_client(client: reqwest::Client, providers: Vec<ProviderEndpoint>) -> Self {
        Self { client, providers }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.providers.clone())
    }

    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        workload: Workload,
    ) -> Result<String, PipelineError> {
        self.exec(&TranslationRequest::new(text, target_language), workload)
            .await
    }

    pub async fn exec(
        &self,
        request: &TranslationRequest,
        workload: Workload,
    ) -> Result<String, PipelineError> {
        let enabled = self.providers.iter().filter(|provider| provider.enabled);
        for provider in enabled {
            match providers::call_provider(&self.client, provider, request, workload).await {
                Ok(translated) => {
                    info!(
                        "translate: {} -> {} via {} ({} chars)",
                        request.source_language,
                        request.target_language,
                        provider.name,
                        translated.chars().count()
                    );
                    return Ok(translated);
                }
                Err(failure) => {
                    warn!("translate: provider {} failed: {}", provider.name, failure);
                }
            }
        }
        warn!(
            "translate: all {} provider(s) failed",
            self.providers.iter().filter(|provider| provider.enabled).count()
        );
        Err(PipelineError::ProviderUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_providers_means_unavailable() {
        let translator = Translator::new(Vec::new());
        let err = translator
            .translate("hello", "fr", Workload::Text)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ProviderUnavailable));
    }
}
