use anyhow::{bail, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::session::Session;
use ort::value::Tensor;
use std::cmp::Ordering;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::application::ports::DetectorPort;
use crate::domain::detection::Detection;
use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

/// Clases COCO en el orden de las exportaciones YOLOv8.
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Detector YOLO sobre ONNX Runtime.
///
/// `Session::run` necesita acceso exclusivo, así que la sesión va detrás de un
/// `Mutex`: hacia fuera el motor es de sólo lectura y se puede compartir.
pub struct OnnxYoloEngine {
    session: Mutex<Session>,
    model: ModelId,
    params: YoloParams,
}

impl OnnxYoloEngine {
    pub fn load(config: &InferenceConfig) -> Result<Self> {
        let builder = Session::builder()?.with_intra_threads(4)?;
        #[cfg(feature = "cuda")]
        let builder = with_cuda(builder);

        // commit_from_memory evita depender de la ruta una vez cargado.
        let model_bytes = fs::read(&config.model.onnx_path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        info!(
            "Modelo {} cargado ({} bytes, imgsz={})",
            config.model.name,
            model_bytes.len(),
            config.params.input_size
        );

        Ok(Self {
            session: Mutex::new(session),
            model: config.model.clone(),
            params: config.params.clone(),
        })
    }
}

// CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
#[cfg(feature = "cuda")]
fn with_cuda(builder: ort::session::builder::SessionBuilder) -> ort::session::builder::SessionBuilder {
    use ort::execution_providers::CUDAExecutionProvider;

    let cuda = CUDAExecutionProvider::default().build();
    match builder.clone().with_execution_providers([cuda]) {
        Ok(with_cuda) => with_cuda,
        Err(e) => {
            tracing::warn!("CUDA no disponible, usando CPU: {}", e);
            builder
        }
    }
}

impl DetectorPort for OnnxYoloEngine {
    fn detect(&self, rgb: &RgbImage) -> Result<Vec<Detection>> {
        let imgsz = self.params.input_size;
        if imgsz == 0 {
            bail!("input_size must be positive");
        }

        let input = preprocess(rgb, imgsz);
        let input_shape = vec![1_i64, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Tensor::from_array((input_shape, input.into_raw_vec_and_offset().0))?;

        let mut session = lock_recovering(&self.session);
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        let output = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;

        let candidates = decode_predictions(output, rgb.width(), rgb.height(), &self.params, &COCO_CLASSES)?;
        let kept = non_max_suppression(candidates, self.params.iou_threshold, self.params.max_detections);
        debug!("{}: {} detecciones tras NMS", self.model.name, kept.len());
        Ok(kept)
    }

    fn name(&self) -> &str {
        &self.model.name
    }
}

/// Un pánico con la sesión tomada envenena el mutex; la sesión no guarda
/// estado entre ejecuciones, así que se recupera y se sigue sirviendo.
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Redimensiona a `imgsz`x`imgsz` y normaliza a NCHW en [0, 1].
pub fn preprocess(rgb: &RgbImage, imgsz: u32) -> Array4<f32> {
    let resized = image::imageops::resize(rgb, imgsz, imgsz, FilterType::Triangle);
    let side = imgsz as usize;

    let mut input = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }
    input
}

/// Interpreta la salida `[1, 4 + nc, N]` de YOLOv8 (cx, cy, w, h, scores...)
/// y devuelve los candidatos por encima de `conf_threshold`, escalados a la
/// imagen original.
pub fn decode_predictions(
    output: ArrayViewD<'_, f32>,
    frame_width: u32,
    frame_height: u32,
    params: &YoloParams,
    classes: &[&str],
) -> Result<Vec<Detection>> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
        bail!("unexpected model output shape {:?}", shape);
    }

    let view = output.index_axis(Axis(0), 0);
    let num_candidates = view.shape()[1];
    let imgsz = params.input_size as f32;
    let sx = frame_width as f32 / imgsz;
    let sy = frame_height as f32 / imgsz;
    let max_x = frame_width as f32;
    let max_y = frame_height as f32;

    let mut detections = Vec::new();

    for i in 0..num_candidates {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score > params.conf_threshold {
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            detections.push(Detection {
                x1: ((cx - w / 2.0) * sx).clamp(0.0, max_x),
                y1: ((cy - h / 2.0) * sy).clamp(0.0, max_y),
                x2: ((cx + w / 2.0) * sx).clamp(0.0, max_x),
                y2: ((cy + h / 2.0) * sy).clamp(0.0, max_y),
                score: max_score,
                class_id,
                label: classes.get(class_id).unwrap_or(&"object").to_string(),
            });
        }
    }

    Ok(detections)
}

/// NMS por clase: ordena por confianza descendente y descarta las cajas que
/// solapan más de `iou_threshold` con otra ya aceptada de la misma clase.
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32, max_detections: usize) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::new();
    for cand in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && k.iou(&cand) > iou_threshold);
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}
