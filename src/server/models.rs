use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateTextRequest {
    pub(crate) text: String,
    pub(crate) target: String,
}

#[derive(Debug, Default)]
pub(crate) struct DocumentUpload {
    pub(crate) filename: Option<String>,
    pub(crate) bytes: Option<Vec<u8>>,
    pub(crate) target: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
