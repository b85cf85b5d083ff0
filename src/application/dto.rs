use serde::{Deserialize, Serialize};

/// Versión publicada por `/health`.
pub const API_VERSION: &str = "1.0";

/// Sobre de respuesta de `/detect`. El campo `status` distingue ambos casos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DetectResponse {
    Success { detections: Vec<String> },
    Error { error: String },
}

impl DetectResponse {
    pub fn success(detections: Vec<String>) -> Self {
        DetectResponse::Success { detections }
    }

    pub fn error(message: impl Into<String>) -> Self {
        DetectResponse::Error { error: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(model: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            model: model.into(),
            version: API_VERSION.to_string(),
        }
    }
}
