use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::http::static_site::DEFAULT_PAGE;
use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

#[derive(Debug, Parser)]
#[command(name = "blindvision", version, about = "YOLO object detection: HTTP service, CLI and static page server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Servicio de detección: `POST /detect` y `GET /health`.
    Serve(ServeArgs),
    /// Detecta objetos en una imagen local e imprime el resultado.
    Detect(DetectArgs),
    /// Sirve un directorio estático sin caché.
    Static(StaticArgs),
}

/// Modelo ONNX y parámetros internos del detector.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Ruta a la exportación ONNX del modelo YOLO.
    #[arg(long, default_value = "models/yolov8n.onnx")]
    pub model: String,
    /// Nombre publicado en /health (por defecto, el nombre del fichero).
    #[arg(long)]
    pub model_name: Option<String>,
    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,
    /// Confianza mínima de los candidatos antes de NMS.
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,
    #[arg(long, default_value_t = 300)]
    pub max_det: usize,
}

impl ModelArgs {
    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            model: ModelId::from_path(self.model.clone(), self.model_name.clone()),
            params: YoloParams {
                input_size: self.imgsz,
                conf_threshold: self.conf,
                iou_threshold: self.iou,
                max_detections: self.max_det,
            },
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, default_value_t = 8000)]
    pub port: u16,
    /// Tamaño máximo de la imagen subida, en MiB.
    #[arg(long, default_value_t = 16)]
    pub max_upload_mb: usize,
    #[command(flatten)]
    pub model: ModelArgs,
}

impl ServeArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    /// Imagen a analizar.
    pub image: PathBuf,
    /// Guarda una copia anotada con las cajas detectadas.
    #[arg(long)]
    pub save: Option<PathBuf>,
    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Clone, Args)]
pub struct StaticArgs {
    /// Directorio a servir.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
    /// Página que se anuncia al arrancar.
    #[arg(long, default_value = DEFAULT_PAGE)]
    pub page: String,
}

impl StaticArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn page_url(&self) -> String {
        format!("http://localhost:{}/{}", self.port, self.page.trim_start_matches('/'))
    }
}
