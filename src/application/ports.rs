use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{detection::Detection, errors::DomainResult, model::ModelId};

/// Capacidad de detección de objetos. Se construye una sola vez y se comparte
/// entre peticiones concurrentes, por eso toma `&self`.
pub trait DetectorPort: Send + Sync {
    /// Detecciones en el orden en que el modelo las emite.
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}
