use serde::{Deserialize, Serialize};
use std::time::Duration;

mod http;

pub(crate) use http::call_provider;

pub const AUTO_SOURCE: &str = "auto";

const DEFAULT_TEXT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOCUMENT_TIMEOUT_SECS: u64 = 60;

/// One external translation service in the fallback chain.
///
/// Everything that differs between services (URL, how the request is
/// shaped, where the translation sits in the response) is data here, so
/// the chain can be reordered or extended from settings alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    pub name: String,
    pub url: String,
    pub request: RequestShape,
    /// Dot-separated path to the translated string, e.g.
    /// `responseData.translatedText`. Numeric segments index arrays.
    pub response_field: String,
    #[serde(default = "default_text_timeout")]
    pub text_timeout_secs: u64,
    #[serde(default = "default_document_timeout")]
    pub document_timeout_secs: u64,
    /// Treat an empty translation as this provider failing.
    #[serde(default = "default_true")]
    pub empty_is_failure: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sent instead of `auto` for services that need an explicit source.
    #[serde(default)]
    pub source_lang: Option<String>,
    /// Environment variable holding an API key, if the service takes one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestShape {
    /// JSON body: `{<text_field>: .., <source_field>: .., <target_field>: .., "format": ..}`.
    PostJson {
        #[serde(default = "default_text_field")]
        text_field: String,
        #[serde(default = "default_source_field")]
        source_field: String,
        #[serde(default = "default_target_field")]
        target_field: String,
        #[serde(default = "default_format")]
        format: Option<String>,
        #[serde(default = "default_json_key_field")]
        api_key_field: String,
    },
    /// Query string: `?<text_param>=..&<langpair_param>=source|target`.
    GetQuery {
        #[serde(default = "default_text_field")]
        text_param: String,
        #[serde(default = "default_langpair_param")]
        langpair_param: String,
        #[serde(default = "default_query_key_param")]
        api_key_param: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    Text,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
    pub source_language: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: target_language.into(),
            source_language: AUTO_SOURCE.to_string(),
        }
    }
}

/// Why a single provider did not produce a translation. Never surfaced to
/// callers; the chain moves on to the next provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("http status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("empty translation")]
    Empty,
}

impl ProviderEndpoint {
    pub fn timeout(&self, workload: Workload) -> Duration {
        let secs = match workload {
            Workload::Text => self.text_timeout_secs,
            Workload::Document => self.document_timeout_secs,
        };
        Duration::from_secs(secs.max(1))
    }

    pub(crate) fn source_for(&self, request: &TranslationRequest) -> String {
        match self.source_lang.as_deref() {
            Some(source)
                if !source.trim().is_empty()
                    && request.source_language.eq_ignore_ascii_case(AUTO_SOURCE) =>
            {
                source.trim().to_string()
            }
            _ => request.source_language.clone(),
        }
    }

    pub(crate) fn api_key(&self) -> Option<String> {
        self.api_key_env.as_deref().and_then(get_env)
    }

    pub fn describe(&self) -> String {
        let shape = match &self.request {
            RequestShape::PostJson { .. } => "POST json",
            RequestShape::GetQuery { .. } => "GET query",
        };
        let mut line = format!(
            "{}\t{} {}\t-> {}\t(timeout {}s/{}s)",
            self.name,
            shape,
            self.url,
            self.response_field,
            self.text_timeout_secs,
            self.document_timeout_secs
        );
        if !self.enabled {
            line.push_str("\tdisabled");
        }
        line
    }
}

/// Follows a dot-separated path through objects and arrays.
pub(crate) fn lookup_field<'a>(
    value: &'a serde_json::Value,
    path: &str,
) -> Option<&'a serde_json::Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            serde_json::Value::Object(map) => map.get(segment),
            serde_json::Value::Array(items) => {
                segment.parse::<usize>().ok().and_then(|idx| items.get(idx))
            }
            _ => None,
        })
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn default_text_timeout() -> u64 {
    DEFAULT_TEXT_TIMEOUT_SECS
}

fn default_document_timeout() -> u64 {
    DEFAULT_DOCUMENT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_text_field() -> String {
    "q".to_string()
}

fn default_source_field() -> String {
    "source".to_string()
}

fn default_target_field() -> String {
    "target".to_string()
}

fn default_format() -> Option<String> {
    Some("text".to_string())
}

fn default_json_key_field() -> String {
    "api_key".to_string()
}

fn default_langpair_param() -> String {
    "langpair".to_string()
}

fn default_query_key_param() -> String {
    "key".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint(toml_src: &str) -> ProviderEndpoint {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn lookup_follows_nested_paths() {
        let value = json!({
            "responseData": {"translatedText": "hola"},
            "matches": [{"translation": "uno"}, {"translation": "dos"}]
        });
        assert_eq!(
            lookup_field(&value, "responseData.translatedText"),
            Some(&json!("hola"))
        );
        assert_eq!(
            lookup_field(&value, "matches.1.translation"),
            Some(&json!("dos"))
        );
        assert_eq!(lookup_field(&value, "responseData.missing"), None);
        assert_eq!(lookup_field(&value, "matches.x"), None);
        assert_eq!(lookup_field(&value, "responseData.translatedText.deeper"), None);
    }

    #[test]
    fn minimal_descriptor_gets_defaults() {
        let provider = endpoint(
            r#"
name = "local"
url = "http://127.0.0.1:5000/translate"
request = { kind = "post_json" }
response_field = "translatedText"
"#,
        );
        assert_eq!(
            provider.request,
            RequestShape::PostJson {
                text_field: "q".to_string(),
                source_field: "source".to_string(),
                target_field: "target".to_string(),
                format: Some("text".to_string()),
                api_key_field: "api_key".to_string(),
            }
        );
        assert!(provider.enabled);
        assert!(provider.empty_is_failure);
        assert_eq!(provider.timeout(Workload::Text), Duration::from_secs(30));
        assert_eq!(provider.timeout(Workload::Document), Duration::from_secs(60));
    }

    #[test]
    fn source_override_only_replaces_auto() {
        let provider = endpoint(
            r#"
name = "mymemory"
url = "https://api.mymemory.translated.net/get"
request = { kind = "get_query" }
response_field = "responseData.translatedText"
source_lang = "en"
"#,
        );
        let auto = TranslationRequest::new("hi", "fr");
        assert_eq!(provider.source_for(&auto), "en");

        let explicit = TranslationRequest {
            source_language: "de".to_string(),
            ..TranslationRequest::new("hi", "fr")
        };
        assert_eq!(provider.source_for(&explicit), "de");
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let provider = endpoint(
            r#"
name = "fast"
url = "http://localhost/"
request = { kind = "get_query" }
response_field = "t"
text_timeout_secs = 0
"#,
        );
        assert_eq!(provider.timeout(Workload::Text), Duration::from_secs(1));
    }
}
