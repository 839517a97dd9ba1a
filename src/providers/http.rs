use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{
    lookup_field, ProviderEndpoint, ProviderFailure, RequestShape, TranslationRequest, Workload,
};

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Sends one translation request to one provider.
pub(crate) async fn call_provider(
    client: &reqwest::Client,
    endpoint: &ProviderEndpoint,
    request: &TranslationRequest,
    workload: Workload,
) -> Result<String, ProviderFailure> {
    let timeout = endpoint.timeout(workload);
    let source = endpoint.source_for(request);
    let api_key = endpoint.api_key();

    let builder = match &endpoint.request {
        RequestShape::PostJson {
            text_field,
            source_field,
            target_field,
            format,
            api_key_field,
        } => {
            let mut body = Map::new();
            body.insert(text_field.clone(), json!(request.text));
            body.insert(source_field.clone(), json!(source));
            body.insert(target_field.clone(), json!(request.target_language));
            if let Some(format) = format {
                body.insert("format".to_string(), json!(format));
            }
            if let Some(key) = api_key {
                body.insert(api_key_field.clone(), json!(key));
            }
            client.post(&endpoint.url).json(&Value::Object(body))
        }
        RequestShape::GetQuery {
            text_param,
            langpair_param,
            api_key_param,
        } => {
            let mut query = vec![
                (text_param.clone(), request.text.clone()),
                (
                    langpair_param.clone(),
                    format!("{}|{}", source, request.target_language),
                ),
            ];
            if let Some(key) = api_key {
                query.push((api_key_param.clone(), key));
            }
            client.get(&endpoint.url).query(&query)
        }
    };

    let response = builder
        .timeout(timeout)
        .send()
        .await
        .map_err(|err| transport_failure(err, timeout))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| transport_failure(err, timeout))?;
    if !status.is_success() {
        return Err(ProviderFailure::Status {
            status,
            body: truncate(&body),
        });
    }
    extract_translation(&body, endpoint)
}

pub(crate) fn extract_translation(
    body: &str,
    endpoint: &ProviderEndpoint,
) -> Result<String, ProviderFailure> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|err| ProviderFailure::MalformedResponse(format!("invalid json: {}", err)))?;
    let value = lookup_field(&payload, &endpoint.response_field).ok_or_else(|| {
        ProviderFailure::MalformedResponse(format!("missing field '{}'", endpoint.response_field))
    })?;
    let translated = value.as_str().ok_or_else(|| {
        ProviderFailure::MalformedResponse(format!(
            "field '{}' is not a string",
            endpoint.response_field
        ))
    })?;
    if endpoint.empty_is_failure && translated.trim().is_empty() {
        return Err(ProviderFailure::Empty);
    }
    Ok(translated.to_string())
}

fn transport_failure(err: reqwest::Error, timeout: Duration) -> ProviderFailure {
    if err.is_timeout() {
        ProviderFailure::Timeout(timeout)
    } else {
        ProviderFailure::Transport(err)
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut out = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();
    out.push_str("...");
    out
}
