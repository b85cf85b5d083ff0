use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use blindvision_detect::{
    adapters::{
        console::detection_report,
        http::{self, state::HttpState, static_site::static_router},
        imaging::annotate::save_annotated,
        onnx::{model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
    },
    application::{
        ports::DetectorPort,
        services::{decode_image, DetectionService, ModelService},
    },
    config::{Cli, Command, DetectArgs, ModelArgs, ServeArgs, StaticArgs},
    domain::postprocess::summarize_detections,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Detect(args) => detect(args).await,
        Command::Static(args) => serve_static(args).await,
    }
}

/// Valida y carga el modelo una única vez; el detector resultante se comparte.
async fn load_detector(model: &ModelArgs) -> anyhow::Result<Arc<dyn DetectorPort>> {
    let infer = model.inference_config();
    tracing::info!("🔧 Cargando modelo {} desde {}", infer.model.name, infer.model.onnx_path);

    let models = ModelService::new(Arc::new(OnnxModelCatalog::new()));
    let detector = models
        .prepare(&infer, OnnxYoloEngine::load)
        .await
        .context("model initialisation failed")?;
    Ok(detector)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let detector = load_detector(&args.model).await?;
    let detection = Arc::new(DetectionService::new(detector));

    let state = HttpState::new(detection).with_max_upload_bytes(args.max_upload_bytes());
    let app = http::router(state);

    let addr = args.addr();
    let listener = http::bind(&addr).await?;
    tracing::info!("🚀 Servicio de detección en http://{}", addr);
    tracing::info!("   POST /detect (campo multipart 'image'), GET /health");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn detect(args: DetectArgs) -> anyhow::Result<()> {
    let detector = load_detector(&args.model).await?;
    let service = DetectionService::new(detector);

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("cannot read {}", args.image.display()))?;
    let rgb = decode_image(&bytes).with_context(|| format!("cannot decode {}", args.image.display()))?;

    let detections = tokio::task::block_in_place(|| service.detect_image(&rgb))?;
    println!("{}", detection_report(&detections));
    if !detections.is_empty() {
        tracing::info!("Resumen: {}", summarize_detections(&detections));
    }

    if let Some(out) = &args.save {
        save_annotated(&rgb, &detections, out)?;
        println!("Annotated image saved to: {}", out.display());
    }
    Ok(())
}

async fn serve_static(args: StaticArgs) -> anyhow::Result<()> {
    let root = tokio::fs::canonicalize(&args.root)
        .await
        .with_context(|| format!("static root {} not found", args.root.display()))?;

    let app = static_router(&root);
    let listener = http::bind(&args.addr()).await?;

    tracing::info!("📂 Sirviendo {} sin caché", root.display());
    tracing::info!("📱 Abrir: {}", args.page_url());
    tracing::info!("⏹️  Ctrl+C para detener");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("👋 Servidor detenido");
        })
        .await?;
    Ok(())
}
