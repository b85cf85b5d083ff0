use image::RgbImage;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    application::ports::{DetectorPort, ModelCatalogPort},
    domain::{
        detection::Detection,
        errors::{DomainError, DomainResult},
        model::{InferenceConfig, REPORT_CONFIDENCE},
        postprocess::{filter_confident, unique_labels},
    },
};

/// Decodifica una imagen (PNG, JPEG, ...) a RGB de 8 bits.
pub fn decode_image(bytes: &[u8]) -> DomainResult<RgbImage> {
    if bytes.is_empty() {
        return Err(DomainError::Decode("empty image payload".into()));
    }
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| DomainError::Decode(e.to_string()))
}

/// Caso de uso principal: imagen → detector → filtro → etiquetas únicas.
/// El detector se comparte entre todas las peticiones; nunca se reconstruye.
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    report_threshold: f32,
}

impl DetectionService {
    pub fn new(detector: Arc<dyn DetectorPort>) -> Self {
        Self::with_threshold(detector, REPORT_CONFIDENCE)
    }

    pub fn with_threshold(detector: Arc<dyn DetectorPort>, report_threshold: f32) -> Self {
        Self { detector, report_threshold }
    }

    pub fn model_name(&self) -> &str {
        self.detector.name()
    }

    /// Ejecuta el detector y devuelve el lote completo, sin filtrar.
    pub fn detect_image(&self, image: &RgbImage) -> DomainResult<Vec<Detection>> {
        self.detector
            .detect(image)
            .map_err(|e| DomainError::DetectionFailure(e.to_string()))
    }

    /// Etiquetas distintas con confianza por encima del umbral de reporte.
    /// Decodificación e inferencia corren en el pool bloqueante de tokio.
    pub async fn detect_labels(&self, payload: Option<Vec<u8>>) -> DomainResult<Vec<String>> {
        let bytes = payload.ok_or(DomainError::MissingInput)?;

        let service = self.clone();
        let batch = tokio::task::spawn_blocking(move || {
            let rgb = decode_image(&bytes)?;
            debug!("Imagen decodificada: {}x{}", rgb.width(), rgb.height());
            service.detect_image(&rgb)
        })
        .await
        .map_err(|e| {
            warn!("La tarea de detección terminó de forma anómala: {}", e);
            DomainError::DetectionFailure(format!("detector crashed: {}", e))
        })??;

        let confident = filter_confident(&batch, self.report_threshold);
        Ok(unique_labels(&confident))
    }
}

/// Valida y carga el modelo antes de exponerlo como detector compartido.
#[derive(Clone)]
pub struct ModelService {
    catalog: Arc<dyn ModelCatalogPort>,
}

impl ModelService {
    pub fn new(catalog: Arc<dyn ModelCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn prepare<D, F>(&self, infer: &InferenceConfig, load: F) -> DomainResult<Arc<dyn DetectorPort>>
    where
        D: DetectorPort + 'static,
        F: FnOnce(&InferenceConfig) -> anyhow::Result<D>,
    {
        // Validación preventiva antes de cargar pesos
        self.catalog.validate_model(&infer.model).await?;

        let detector = load(infer).map_err(|e| {
            DomainError::InvalidInput(format!("cannot load model {}: {:#}", infer.model.onnx_path, e))
        })?;
        Ok(Arc::new(detector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ModelId, YoloParams};
    use async_trait::async_trait;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    struct FixedDetector(Vec<Detection>);

    impl DetectorPort for FixedDetector {
        fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingDetector;

    impl DetectorPort for FailingDetector {
        fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
            anyhow::bail!("unexpected output shape [1, 2]")
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingDetector;

    impl DetectorPort for PanickingDetector {
        fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
            panic!("index out of bounds")
        }
        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn det(label: &str, score: f32) -> Detection {
        Detection { x1: 1.0, y1: 1.0, x2: 4.0, y2: 4.0, score, class_id: 0, label: label.into() }
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([10, 200, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn labels_are_filtered_and_deduplicated() {
        let detector = FixedDetector(vec![det("cat", 0.9), det("dog", 0.3), det("cat", 0.7), det("car", 0.6)]);
        let service = DetectionService::new(Arc::new(detector));

        let labels = service.detect_labels(Some(png_bytes())).await.unwrap();
        assert_eq!(labels, ["cat", "car"]);
    }

    #[tokio::test]
    async fn empty_batch_is_success() {
        let service = DetectionService::new(Arc::new(FixedDetector(vec![])));
        assert!(service.detect_labels(Some(png_bytes())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_payload_is_reported() {
        let service = DetectionService::new(Arc::new(FixedDetector(vec![])));
        let err = service.detect_labels(None).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingInput));
    }

    #[tokio::test]
    async fn garbage_payload_is_decode_error() {
        let service = DetectionService::new(Arc::new(FixedDetector(vec![])));
        let err = service.detect_labels(Some(b"not an image".to_vec())).await.unwrap_err();
        assert!(matches!(err, DomainError::Decode(_)));

        let err = service.detect_labels(Some(Vec::new())).await.unwrap_err();
        assert!(matches!(err, DomainError::Decode(_)));
    }

    #[tokio::test]
    async fn detector_error_maps_to_detection_failure() {
        let service = DetectionService::new(Arc::new(FailingDetector));
        let err = service.detect_labels(Some(png_bytes())).await.unwrap_err();
        match err {
            DomainError::DetectionFailure(msg) => assert!(msg.contains("unexpected output shape")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn detector_panic_is_contained() {
        let service = DetectionService::new(Arc::new(PanickingDetector));
        let err = service.detect_labels(Some(png_bytes())).await.unwrap_err();
        assert!(matches!(err, DomainError::DetectionFailure(_)));
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let detector = FixedDetector(vec![det("cat", 0.4)]);
        let service = DetectionService::with_threshold(Arc::new(detector), 0.3);
        let rt = tokio::runtime::Runtime::new().unwrap();
        let labels = rt.block_on(service.detect_labels(Some(png_bytes()))).unwrap();
        assert_eq!(labels, ["cat"]);
    }

    struct AcceptAll;

    #[async_trait]
    impl ModelCatalogPort for AcceptAll {
        async fn validate_model(&self, _model: &ModelId) -> DomainResult<()> {
            Ok(())
        }
    }

    struct RejectAll;

    #[async_trait]
    impl ModelCatalogPort for RejectAll {
        async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
            Err(DomainError::NotFound(model.onnx_path.clone()))
        }
    }

    fn config() -> InferenceConfig {
        InferenceConfig { model: ModelId::from_path("models/yolov8n.onnx", None), params: YoloParams::default() }
    }

    #[tokio::test]
    async fn prepare_loads_after_validation() {
        let models = ModelService::new(Arc::new(AcceptAll));
        let detector = models
            .prepare(&config(), |_| Ok(FixedDetector(vec![])))
            .await
            .unwrap();
        assert_eq!(detector.name(), "fixed");
    }

    #[tokio::test]
    async fn prepare_stops_on_invalid_model() {
        let models = ModelService::new(Arc::new(RejectAll));
        let result = models
            .prepare(&config(), |_| -> anyhow::Result<FixedDetector> { panic!("must not load") })
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn prepare_reports_loader_failure() {
        let models = ModelService::new(Arc::new(AcceptAll));
        let result = models
            .prepare(&config(), |_| -> anyhow::Result<FixedDetector> { anyhow::bail!("corrupt protobuf") })
            .await;
        match result {
            Err(DomainError::InvalidInput(msg)) => assert!(msg.contains("corrupt protobuf")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("loader failure must propagate"),
        }
    }
}
