#![allow(dead_code)]

use anyhow::{anyhow, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use doc_translator::{
    Extractor, OcrEngine, OcrFuture, PdfPage, PdfRenderer, Pipeline, ProviderEndpoint,
    RequestShape, Translator,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answers `{"translatedText": ..}` and `{"responseData": {"translatedText": ..}}`.
    Translate(&'static str),
    /// Translates by appending the target language to the input.
    Echo,
    Status(u16),
    Malformed,
    Empty,
    Hang(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub method: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

struct MockState {
    behavior: Behavior,
    hits: AtomicUsize,
    seen: Mutex<Vec<Seen>>,
}

pub struct MockProvider {
    pub url: String,
    state: Arc<MockState>,
}

impl MockProvider {
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn post_json(&self, name: &str) -> ProviderEndpoint {
        endpoint(
            name,
            &self.url,
            RequestShape::PostJson {
                text_field: "q".to_string(),
                source_field: "source".to_string(),
                target_field: "target".to_string(),
                format: Some("text".to_string()),
                api_key_field: "api_key".to_string(),
            },
            "translatedText",
        )
    }

    pub fn get_query(&self, name: &str) -> ProviderEndpoint {
        endpoint(
            name,
            &self.url,
            RequestShape::GetQuery {
                text_param: "q".to_string(),
                langpair_param: "langpair".to_string(),
                api_key_param: "key".to_string(),
            },
            "responseData.translatedText",
        )
    }
}

fn endpoint(name: &str, url: &str, request: RequestShape, field: &str) -> ProviderEndpoint {
    ProviderEndpoint {
        name: name.to_string(),
        url: url.to_string(),
        request,
        response_field: field.to_string(),
        text_timeout_secs: 1,
        document_timeout_secs: 1,
        empty_is_failure: true,
        enabled: true,
        source_lang: None,
        api_key_env: None,
    }
}

pub async fn spawn_provider(behavior: Behavior) -> MockProvider {
    let state = Arc::new(MockState {
        behavior,
        hits: AtomicUsize::new(0),
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/translate", any(handle))
        .with_state(state.clone());
    let addr = serve(app).await;
    MockProvider {
        url: format!("http://{}/translate", addr),
        state,
    }
}

pub async fn serve(app: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: axum::http::Method,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let body = serde_json::from_str::<Value>(&body).ok();
    let input = body
        .as_ref()
        .and_then(|value| value.get("q"))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .or_else(|| query.get("q").cloned())
        .unwrap_or_default();
    let target = body
        .as_ref()
        .and_then(|value| value.get("target"))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .or_else(|| {
            query
                .get("langpair")
                .and_then(|pair| pair.split('|').nth(1))
                .map(|value| value.to_string())
        })
        .unwrap_or_default();
    state.seen.lock().unwrap().push(Seen {
        method: method.to_string(),
        query,
        body,
    });

    match &state.behavior {
        Behavior::Translate(text) => translated(text),
        Behavior::Echo => translated(&format!("{} [{}]", input, target)),
        Behavior::Status(code) => (
            StatusCode::from_u16(*code).unwrap(),
            "upstream unavailable",
        )
            .into_response(),
        Behavior::Malformed => (StatusCode::OK, "<html>oops</html>").into_response(),
        Behavior::Empty => translated(""),
        Behavior::Hang(delay) => {
            tokio::time::sleep(*delay).await;
            translated("too late")
        }
    }
}

fn translated(text: &str) -> Response {
    Json(json!({
        "translatedText": text,
        "responseData": { "translatedText": text },
    }))
    .into_response()
}

/// Pages as text; an empty string is a scanned page.
pub struct StubRenderer {
    pub pages: Vec<&'static str>,
}

impl PdfRenderer for StubRenderer {
    fn load(&self, pdf: &[u8]) -> Result<Vec<PdfPage>> {
        if !pdf.starts_with(b"%PDF") {
            return Err(anyhow!("not a pdf"));
        }
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(idx, text)| PdfPage {
                number: idx as u32 + 1,
                text: text.to_string(),
            })
            .collect())
    }

    fn rasterize(&self, _pdf: &[u8], page: u32) -> Result<Vec<u8>> {
        Ok(format!("page-{}", page).into_bytes())
    }
}

/// Recognizes every bitmap as the same text.
pub struct StubOcr(pub &'static str);

impl OcrEngine for StubOcr {
    fn recognize<'a>(&'a self, _image_png: &'a [u8]) -> OcrFuture<'a> {
        let text = self.0.to_string();
        Box::pin(async move { Ok(text) })
    }
}

pub fn pipeline(providers: Vec<ProviderEndpoint>) -> Pipeline {
    pipeline_with_pdf(providers, vec![], "")
}

pub fn pipeline_with_pdf(
    providers: Vec<ProviderEndpoint>,
    pages: Vec<&'static str>,
    ocr_text: &'static str,
) -> Pipeline {
    Pipeline::new(
        Extractor::new(Arc::new(StubRenderer { pages }), Arc::new(StubOcr(ocr_text))),
        Translator::new(providers),
    )
}
