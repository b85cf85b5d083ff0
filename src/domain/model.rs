use serde::{Deserialize, Serialize};
use std::path::Path;

/// Umbral de confianza a partir del cual una detección se reporta al cliente.
pub const REPORT_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelId {
    pub name: String,       // logical name, e.g. "yolov8n"
    pub onnx_path: String,  // filesystem path
}

impl ModelId {
    /// Construye el identificador; sin nombre explícito se usa el nombre del fichero.
    pub fn from_path(onnx_path: impl Into<String>, name: Option<String>) -> Self {
        let onnx_path = onnx_path.into();
        let name = name.unwrap_or_else(|| {
            Path::new(&onnx_path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "yolo".to_string())
        });
        Self { name, onnx_path }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,        // 640 typical
    pub conf_threshold: f32,    // 0..1
    pub iou_threshold: f32,     // 0..1
    pub max_detections: usize,  // e.g. 300
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub model: ModelId,
    pub params: YoloParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_name_defaults_to_file_stem() {
        let id = ModelId::from_path("models/yolov8n.onnx", None);
        assert_eq!(id.name, "yolov8n");
        assert_eq!(id.onnx_path, "models/yolov8n.onnx");
    }

    #[test]
    fn explicit_model_name_wins() {
        let id = ModelId::from_path("models/custom.onnx", Some("street".into()));
        assert_eq!(id.name, "street");
    }

    #[test]
    fn empty_path_falls_back_to_generic_name() {
        assert_eq!(ModelId::from_path("", None).name, "yolo");
    }
}
