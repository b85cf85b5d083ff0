use std::sync::Arc;
use crate::application::services::DetectionService;

/// Estado compartido para los manejadores HTTP de Axum.
/// Contiene el caso de uso de detección, con el detector ya cargado.
#[derive(Clone)]
pub struct HttpState {
    pub detection: Arc<DetectionService>,
    /// Tamaño máximo aceptado para el cuerpo multipart de `/detect`.
    pub max_upload_bytes: usize,
}

impl HttpState {
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

    pub fn new(detection: Arc<DetectionService>) -> Self {
        Self { detection, max_upload_bytes: Self::DEFAULT_MAX_UPLOAD_BYTES }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
