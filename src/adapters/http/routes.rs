use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::adapters::http::state::HttpState;
use crate::application::dto::{DetectResponse, HealthResponse};
use crate::domain::errors::{DomainError, DomainResult};

/// Nombre del campo multipart que transporta la imagen.
pub const IMAGE_FIELD: &str = "image";

pub async fn detect(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let outcome = match read_image_field(multipart, st.max_upload_bytes).await {
        Ok(payload) => st.detection.detect_labels(payload).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(labels) => {
            info!("Detectado: [{}]", labels.join(", "));
            Json(DetectResponse::success(labels)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn health(State(st): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(st.detection.model_name()))
}

/// Bytes del campo `image`, o `None` si la petición no lo trae.
/// Un cuerpo que no es multipart cuenta como petición sin imagen.
async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
    limit: usize,
) -> DomainResult<Option<Vec<u8>>> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            debug!("Petición sin cuerpo multipart: {}", rejection);
            return Ok(None);
        }
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit, "malformed multipart body"))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit, "cannot read image field"))?;
        return Ok(Some(bytes.to_vec()));
    }
    Ok(None)
}

/// Superar el límite de cuerpo no es una imagen corrupta: se reporta aparte.
fn multipart_error(e: MultipartError, limit: usize, context: &str) -> DomainError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::PayloadTooLarge(limit)
    } else {
        DomainError::Decode(format!("{}: {}", context, e))
    }
}
