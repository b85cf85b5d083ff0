use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

/// Catálogo de modelos en disco: sólo acepta exportaciones `.onnx` existentes.
pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

impl Default for OnnxModelCatalog {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        let path = Path::new(&model.onnx_path);
        let is_onnx = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("onnx"))
            .unwrap_or(false);
        if !is_onnx {
            return Err(DomainError::InvalidInput(format!(
                "expected an .onnx export, got {}",
                model.onnx_path
            )));
        }
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {
                debug!("Modelo {} validado ({} bytes)", model.name, meta.len());
                Ok(())
            }
            Ok(_) => Err(DomainError::InvalidInput(format!("not a file: {}", model.onnx_path))),
            Err(_) => Err(DomainError::NotFound(format!("model file not found: {}", model.onnx_path))),
        }
    }
}
