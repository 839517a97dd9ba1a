use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{DocumentUpload, ErrorResponse, TranslateTextRequest};
use super::state::ServerState;
use crate::pipeline::{Pipeline, PipelineResponse};
use crate::settings;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let pipeline = Pipeline::from_settings(&settings);
    let app = router(pipeline);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("server: listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(pipeline: Pipeline) -> Router {
    let state = Arc::new(ServerState { pipeline });
    Router::new()
        .route("/", get(health))
        .route("/translate", post(translate))
        .route("/translate-document", post(translate_document))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

async fn translate(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<TranslateTextRequest>, JsonRejection>,
) -> Result<Json<PipelineResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    let result = state
        .pipeline
        .translate_text(&payload.text, &payload.target)
        .await;
    Ok(Json(result.into_response()))
}

async fn translate_document(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PipelineResponse>, ApiError> {
    let multipart = multipart.map_err(|rejection| bad_request(rejection.body_text()))?;
    let upload = read_upload(multipart).await?;
    let bytes = upload
        .bytes
        .ok_or_else(|| bad_request("file field is required"))?;
    let target = upload
        .target
        .ok_or_else(|| bad_request("target field is required"))?;
    let filename = upload.filename.unwrap_or_default();
    info!(
        "server: document upload {} ({} bytes)",
        filename,
        bytes.len()
    );
    let result = state
        .pipeline
        .extract_and_translate(bytes, &filename, &target)
        .await;
    Ok(Json(result.into_response()))
}

async fn read_upload(mut multipart: Multipart) -> Result<DocumentUpload, ApiError> {
    let mut upload = DocumentUpload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.filename = field.file_name().map(|name| name.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| bad_request(err.body_text()))?;
                upload.bytes = Some(bytes.to_vec());
            }
            "target" => {
                let target = field
                    .text()
                    .await
                    .map_err(|err| bad_request(err.body_text()))?;
                upload.target = Some(target);
            }
            other => {
                warn!("server: ignoring form field '{}'", other);
            }
        }
    }
    Ok(upload)
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
